//! Product type and sub id inference for builders that do not declare them.

use std::fs;
use std::path::Path;

use crate::asset::AssetType;
use crate::subid::{self, FLAG_ABDATA, FLAG_ALPHA, FLAG_DIFF};

use super::sniff::sniff_asset_type;
use super::table::{
    InferenceStage, DIFFUSE_MARKER, DOUBLE_EXTENSIONS, DYNAMIC_SLICE, DYNAMIC_SLICE_SUB_ID,
    ENTITY_ICON, ENTITY_ICON_SUB_ID, EXTENSIONS, INFERENCE_ORDER, MAX_VARIANT_INDEX, MESH,
    SKINNED_MESH, SKINNED_MESH_LODS, SLICE, SLICE_SUB_ID, SNIFFED_EXTENSIONS, STATIC_MESH_LODS,
    TEXTURE, TEXTURE_MIPS, VARIANT_FAMILIES,
};

/// A parsed mip or LOD suffix: `.3`, `.3a` or `.a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantSuffix {
    /// 0 when only the alpha marker is present.
    pub index: u32,
    pub alpha: bool,
}

/// Parse the final extension (without its dot) as a variant suffix.
pub fn parse_variant_suffix(extension: &str) -> Option<VariantSuffix> {
    let (digits, alpha) = match extension.strip_suffix(['a', 'A']) {
        Some(digits) => (digits, true),
        None => (extension, false),
    };

    if digits.is_empty() {
        return alpha.then_some(VariantSuffix { index: 0, alpha });
    }
    if digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index: u32 = digits.parse().ok()?;
    (1..=MAX_VARIANT_INDEX).contains(&index).then_some(VariantSuffix { index, alpha })
}

/// The file name component of a path, lowercased.
fn file_name_lower(product_file: &str) -> String {
    let name = product_file.rsplit(['/', '\\']).next().unwrap_or(product_file);
    name.to_lowercase()
}

/// Split `name` at its last dot into `(stem, extension)`. The extension
/// excludes the dot; a leading dot alone does not start an extension.
fn split_extension(name: &str) -> Option<(&str, &str)> {
    let dot = name.rfind('.')?;
    if dot == 0 {
        return None;
    }
    Some((&name[..dot], &name[dot + 1..]))
}

fn variant_family(name: &str) -> Option<(AssetType, VariantSuffix)> {
    let (stem, extension) = split_extension(name)?;
    let suffix = parse_variant_suffix(extension)?;
    VARIANT_FAMILIES
        .iter()
        .find(|(family, _)| stem.ends_with(family))
        .map(|(_, ty)| (*ty, suffix))
}

/// Infer the product type from its file name, and for structured documents
/// from the file content at `product_file`.
pub fn infer_asset_type(product_file: &str) -> AssetType {
    let name = file_name_lower(product_file);
    let Some((_, extension)) = split_extension(&name) else {
        return AssetType::NULL;
    };
    let extension = format!(".{extension}");

    for stage in INFERENCE_ORDER {
        let inferred = match stage {
            InferenceStage::DoubleExtension => DOUBLE_EXTENSIONS
                .iter()
                .find(|(suffix, _)| name.ends_with(suffix))
                .map(|(_, ty)| *ty),
            InferenceStage::VariantSuffix => variant_family(&name).map(|(ty, _)| ty),
            InferenceStage::Extension => {
                EXTENSIONS.iter().find(|(ext, _)| *ext == extension).map(|(_, ty)| *ty)
            }
            InferenceStage::ContentSniff => {
                if SNIFFED_EXTENSIONS.contains(&extension.as_str()) {
                    sniff_file(Path::new(product_file))
                } else {
                    None
                }
            }
        };
        if let Some(ty) = inferred.filter(|ty| !ty.is_null()) {
            return ty;
        }
    }

    AssetType::NULL
}

fn sniff_file(path: &Path) -> Option<AssetType> {
    let bytes = fs::read(path).ok()?;
    if bytes.is_empty() {
        return None;
    }
    Some(sniff_asset_type(&String::from_utf8_lossy(&bytes)))
}

/// Infer the packed sub id for a product of `asset_type` named `product_file`.
pub fn infer_sub_id(asset_type: AssetType, product_file: &str) -> u32 {
    if asset_type == SLICE {
        return SLICE_SUB_ID;
    }
    if asset_type == DYNAMIC_SLICE {
        return DYNAMIC_SLICE_SUB_ID;
    }

    let name = file_name_lower(product_file);
    if DOUBLE_EXTENSIONS.iter().any(|(suffix, _)| name.ends_with(suffix)) {
        return FLAG_ABDATA;
    }
    if split_extension(&name).is_none() {
        return 0;
    }
    if asset_type == MESH || asset_type == SKINNED_MESH {
        return 0;
    }
    if asset_type == ENTITY_ICON {
        return ENTITY_ICON_SUB_ID;
    }

    let mut sub_id = 0;
    if (asset_type == TEXTURE || asset_type == TEXTURE_MIPS) && name.contains(DIFFUSE_MARKER) {
        sub_id |= FLAG_DIFF;
    }
    if asset_type == TEXTURE {
        return sub_id;
    }

    if asset_type == TEXTURE_MIPS
        || asset_type == STATIC_MESH_LODS
        || asset_type == SKINNED_MESH_LODS
    {
        if let Some((_, suffix)) = variant_family(&name) {
            if suffix.alpha {
                sub_id |= FLAG_ALPHA;
            }
            if suffix.index > 0 {
                sub_id = subid::construct(0, suffix.index, sub_id);
            }
        }
        return sub_id;
    }

    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::table::*;
    use crate::subid::{get_id, get_lod};
    use std::io::Write;

    #[test]
    fn test_parse_variant_suffix() {
        assert_eq!(parse_variant_suffix("3"), Some(VariantSuffix { index: 3, alpha: false }));
        assert_eq!(parse_variant_suffix("11a"), Some(VariantSuffix { index: 11, alpha: true }));
        assert_eq!(parse_variant_suffix("a"), Some(VariantSuffix { index: 0, alpha: true }));
        assert_eq!(parse_variant_suffix("12"), None);
        assert_eq!(parse_variant_suffix("0"), None);
        assert_eq!(parse_variant_suffix("03"), None);
        assert_eq!(parse_variant_suffix(""), None);
        assert_eq!(parse_variant_suffix("dds"), None);
    }

    #[test]
    fn test_double_extension_wins() {
        assert_eq!(infer_asset_type("bundles/level.abdata.json"), BUNDLE_DATA);
        assert_eq!(infer_sub_id(BUNDLE_DATA, "bundles/level.abdata.json"), FLAG_ABDATA);
    }

    #[test]
    fn test_variant_families() {
        assert_eq!(infer_asset_type("rock_cm.dds.3"), TEXTURE_MIPS);
        assert_eq!(infer_asset_type("rock.cgf.1"), STATIC_MESH_LODS);
        assert_eq!(infer_asset_type("hero.skin.2a"), SKINNED_MESH_LODS);
        assert_eq!(infer_asset_type("rock.dds.a"), TEXTURE_MIPS);
    }

    #[test]
    fn test_variant_suffix_must_be_final_extension() {
        // ".3" in the middle of the name is not a LOD marker
        assert_eq!(infer_asset_type("rock.3.dds"), TEXTURE);
        assert_eq!(infer_sub_id(TEXTURE_MIPS, "rock.dds.3.bak"), 0);
    }

    #[test]
    fn test_plain_extensions() {
        assert_eq!(infer_asset_type("Rock.DDS"), TEXTURE);
        assert_eq!(infer_asset_type("rock.cgf"), MESH);
        assert_eq!(infer_asset_type("hero.skin"), SKINNED_MESH);
        assert_eq!(infer_asset_type("hero.chr"), SKELETON);
        assert_eq!(infer_asset_type("hero.actor"), ACTOR);
        assert_eq!(infer_asset_type("walk.motion"), MOTION);
        assert_eq!(infer_asset_type("all.motionset"), MOTION_SET);
        assert_eq!(infer_asset_type("brain.animgraph"), ANIM_GRAPH);
    }

    #[test]
    fn test_unknown_and_extensionless() {
        assert_eq!(infer_asset_type("README"), AssetType::NULL);
        assert_eq!(infer_asset_type("data.bin"), AssetType::NULL);
        assert_eq!(infer_asset_type(".hidden"), AssetType::NULL);
        assert_eq!(infer_sub_id(TEXTURE, "README"), 0);
    }

    #[test]
    fn test_xml_content_sniff() {
        let mut file = tempfile::Builder::new().suffix(".xml").tempfile().unwrap();
        write!(file, "<GameTokensLibrary><Token/></GameTokensLibrary>").unwrap();
        let path = file.path().to_string_lossy().to_string();
        assert_eq!(infer_asset_type(&path), GAME_TOKENS_LIBRARY);
    }

    #[test]
    fn test_xml_missing_file_is_unknown() {
        assert_eq!(infer_asset_type("/definitely/not/here.xml"), AssetType::NULL);
    }

    #[test]
    fn test_lod_sub_id() {
        let sub_id = infer_sub_id(TEXTURE_MIPS, "rock_cm.dds.3");
        assert_eq!(get_lod(sub_id), 3);
        assert_eq!(get_id(sub_id), 0);
        assert_eq!(sub_id & (FLAG_DIFF | FLAG_ALPHA), 0);
    }

    #[test]
    fn test_diffuse_alpha_lod_sub_id() {
        let sub_id = infer_sub_id(TEXTURE_MIPS, "rock_cm_diff.dds.3a");
        assert_eq!(sub_id & FLAG_DIFF, FLAG_DIFF);
        assert_eq!(sub_id & FLAG_ALPHA, FLAG_ALPHA);
        assert_eq!(get_lod(sub_id), 3);
        assert_eq!(get_id(sub_id), 0);
    }

    #[test]
    fn test_plain_texture_sub_id() {
        assert_eq!(infer_sub_id(TEXTURE, "rock_diff.dds"), FLAG_DIFF);
        assert_eq!(infer_sub_id(TEXTURE, "rock.dds"), 0);
    }

    #[test]
    fn test_fixed_sub_ids() {
        assert_eq!(infer_sub_id(SLICE, "level.slice"), SLICE_SUB_ID);
        assert_eq!(infer_sub_id(DYNAMIC_SLICE, "spawn.dynamicslice"), DYNAMIC_SLICE_SUB_ID);
        assert_eq!(infer_sub_id(ENTITY_ICON, "icon.png"), ENTITY_ICON_SUB_ID);
        assert_eq!(infer_sub_id(MESH, "rock.cgf"), 0);
        assert_eq!(infer_sub_id(SKINNED_MESH, "hero.skin"), 0);
        assert_eq!(infer_sub_id(ACTOR, "hero.actor"), 0);
    }

    #[test]
    fn test_alpha_only_suffix() {
        let sub_id = infer_sub_id(TEXTURE_MIPS, "rock.dds.a");
        assert_eq!(sub_id, FLAG_ALPHA);
    }
}
