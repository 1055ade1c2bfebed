//! Declarative tables driving legacy product type inference.
//!
//! Stages are evaluated in [`INFERENCE_ORDER`]; the first stage that yields a
//! non-null type wins.

use crate::asset::AssetType;

pub const TEXTURE: AssetType = AssetType::from_u128(0x59D5E20B_34DB_4D8E_B867_D33CC2556355);
pub const TEXTURE_MIPS: AssetType = AssetType::from_u128(0x3918728C_D3CA_4D9E_813E_A5ED20C6821E);
pub const MESH: AssetType = AssetType::from_u128(0xC2869E3B_DDA0_4E01_8FE3_6770D788866B);
pub const STATIC_MESH_LODS: AssetType =
    AssetType::from_u128(0x9AAE4926_CB6A_4C60_9948_A1A22F51DB23);
pub const SKINNED_MESH: AssetType = AssetType::from_u128(0xC5D443E1_41FF_4263_8654_9438BC888CB7);
pub const SKINNED_MESH_LODS: AssetType =
    AssetType::from_u128(0x58E5824F_C27B_46FD_AD48_865BA41B7A51);
pub const SKELETON: AssetType = AssetType::from_u128(0x60161B46_21F0_4396_A4F0_F2CCF0664CDE);
pub const ACTOR: AssetType = AssetType::from_u128(0xF67CC648_EA51_464C_9F5D_4A9CE41A7F86);
pub const MOTION: AssetType = AssetType::from_u128(0x00494B8E_7578_4BA2_8B28_272E90680787);
pub const MOTION_SET: AssetType = AssetType::from_u128(0x1DA936A0_F766_4B2F_B89C_9F4C8E1310F9);
pub const ANIM_GRAPH: AssetType = AssetType::from_u128(0x28003359_4A29_41AE_8198_0AEFE9FF5263);
pub const BUNDLE_DATA: AssetType = AssetType::from_u128(0xD0A5E84E_9866_4AD7_A6A1_4D28FE7871C5);
pub const FONT: AssetType = AssetType::from_u128(0x57767D37_0EBE_43BE_8F60_AB36D2056EF8);
pub const PARTICLE_LIBRARY: AssetType =
    AssetType::from_u128(0x6EB56B55_1B58_4EE3_A268_27680338AE56);
pub const LENS_FLARE_LIBRARY: AssetType =
    AssetType::from_u128(0xCF44D1F0_F178_4A3D_A9E6_D44721F50C20);
pub const PREFABS_LIBRARY: AssetType = AssetType::from_u128(0x2DC3C556_9461_4729_8313_2BA0CB64EF52);
pub const ENTITY_PROTOTYPE_LIBRARY: AssetType =
    AssetType::from_u128(0xB034F8AB_D881_4A35_A408_184E3FDEB2FE);
pub const GAME_TOKENS_LIBRARY: AssetType =
    AssetType::from_u128(0x1D4B56F8_366A_4040_B645_AE87E3A00DAB);
pub const UI_CANVAS: AssetType = AssetType::from_u128(0xE48DDAC8_1F1E_4183_AAAB_37424BCC254B);
pub const ENTITY_ICON: AssetType = AssetType::from_u128(0x3436C30E_E2C5_4C3B_A7B9_66C94A28701B);
pub const SLICE: AssetType = AssetType::from_u128(0xC62C7A87_9C09_4148_A985_12F2C99C0A45);
pub const DYNAMIC_SLICE: AssetType = AssetType::from_u128(0x78802ABF_9595_463A_8D2B_D022F906F9B1);

/// Fixed sub id of every slice product.
pub const SLICE_SUB_ID: u32 = 1;
/// Fixed sub id of every dynamic slice product.
pub const DYNAMIC_SLICE_SUB_ID: u32 = 2;
/// Fixed sub id of every entity icon product.
pub const ENTITY_ICON_SUB_ID: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceStage {
    /// Multi-part extensions such as `.abdata.json`.
    DoubleExtension,
    /// A numbered mip or LOD suffix on a known family, e.g. `rock.dds.3a`.
    VariantSuffix,
    /// A plain single extension.
    Extension,
    /// Root element of a structured document.
    ContentSniff,
}

pub const INFERENCE_ORDER: [InferenceStage; 4] = [
    InferenceStage::DoubleExtension,
    InferenceStage::VariantSuffix,
    InferenceStage::Extension,
    InferenceStage::ContentSniff,
];

pub const DOUBLE_EXTENSIONS: &[(&str, AssetType)] = &[(".abdata.json", BUNDLE_DATA)];

/// Family extension that must precede a variant suffix, and the type it yields.
pub const VARIANT_FAMILIES: &[(&str, AssetType)] = &[
    (".dds", TEXTURE_MIPS),
    (".cgf", STATIC_MESH_LODS),
    (".skin", SKINNED_MESH_LODS),
];

/// Highest numbered variant suffix (`.11` / `.11a`).
pub const MAX_VARIANT_INDEX: u32 = 11;

pub const EXTENSIONS: &[(&str, AssetType)] = &[
    (".dds", TEXTURE),
    (".cgf", MESH),
    (".skin", SKINNED_MESH),
    (".chr", SKELETON),
    (".actor", ACTOR),
    (".motion", MOTION),
    (".motionset", MOTION_SET),
    (".animgraph", ANIM_GRAPH),
];

/// Extensions whose content is sniffed.
pub const SNIFFED_EXTENSIONS: &[&str] = &[".xml"];

/// Root element names, compared case-insensitively.
pub const DOCUMENT_ROOTS: &[(&str, AssetType)] = &[
    ("fontshader", FONT),
    ("ParticleLibrary", PARTICLE_LIBRARY),
    ("LensFlareLibrary", LENS_FLARE_LIBRARY),
    ("PrefabsLibrary", PREFABS_LIBRARY),
    ("EntityPrototypeLibrary", ENTITY_PROTOTYPE_LIBRARY),
    ("GameTokensLibrary", GAME_TOKENS_LIBRARY),
];

/// Root element of a serialized object stream.
pub const OBJECT_STREAM_ROOT: &str = "ObjectStream";

/// Class id whose presence anywhere in an object stream marks a UI canvas.
pub const UI_CANVAS_MARKER: &str = "{50B8CF6C-B19A-4D86-AFE9-96EFB820D422}";

/// Attribute on an object stream's first-level children naming their type.
pub const OBJECT_TYPE_ATTRIBUTE: &str = "type";

/// Marker in a texture name selecting the diffuse variant.
pub const DIFFUSE_MARKER: &str = "_diff.";
