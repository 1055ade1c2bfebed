//! Inspection command implementations (hash, infer)

use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::AssetPipeConfig;
use crate::fingerprint::NO_HASH;
use crate::legacy::{infer_asset_type, infer_sub_id};
use crate::subid::{get_id, get_lod};

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the hash command
pub fn run_hash(config: &AssetPipeConfig, files: &[PathBuf], json: bool) -> ExitCode {
    let hashes = config.hashing.hasher().hash_files(files);
    let unreadable = hashes.iter().filter(|(_, digest)| *digest == NO_HASH).count();

    if json {
        let entries: Vec<_> = hashes
            .iter()
            .map(|(path, digest)| {
                serde_json::json!({
                    "path": path.display().to_string(),
                    "hash": if *digest == NO_HASH { None } else { Some(format!("{:016x}", digest)) },
                })
            })
            .collect();
        println!("{}", serde_json::Value::Array(entries));
    } else {
        for (path, digest) in &hashes {
            if *digest == NO_HASH {
                eprintln!("Error: unable to open {}", path.display());
            } else {
                println!("{:016x}  {}", digest, path.display());
            }
        }
    }

    if unreadable > 0 {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}

/// Execute the infer command
pub fn run_infer(files: &[PathBuf], json: bool) -> ExitCode {
    let mut unknown = 0;
    let mut entries = Vec::new();

    for path in files {
        let name = path.to_string_lossy();
        let asset_type = infer_asset_type(&name);
        let sub_id = infer_sub_id(asset_type, &name);
        if asset_type.is_null() {
            unknown += 1;
        }

        if json {
            entries.push(serde_json::json!({
                "path": name,
                "asset_type": if asset_type.is_null() { None } else { Some(asset_type.to_string()) },
                "sub_id": sub_id,
                "id": get_id(sub_id),
                "lod": get_lod(sub_id),
            }));
        } else if asset_type.is_null() {
            println!("{}: unknown type", name);
        } else {
            println!(
                "{}: type {} sub id 0x{:08x} (id {}, lod {})",
                name,
                asset_type,
                sub_id,
                get_id(sub_id),
                get_lod(sub_id)
            );
        }
    }

    if json {
        println!("{}", serde_json::Value::Array(entries));
    }

    if unknown > 0 {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
