//! Check command implementation

use std::process::ExitCode;

use crate::builder::BuilderRegistry;
use crate::config::AssetPipeConfig;
use crate::copy_builder::register_recognizers;
use crate::legacy::LegacyPlatform;
use crate::platform::PlatformInfo;

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the check command
///
/// Loading already validated the file; this reports what it declares, any
/// pattern the registry could not compile, and declared sub ids that the
/// overflow policy in effect refuses.
pub fn run_check(config: &AssetPipeConfig) -> ExitCode {
    let platforms = config.platform_infos();
    println!("Project: {}", config.project.name);
    println!("Platforms ({}):", platforms.len());
    for platform in &platforms {
        let legacy = LegacyPlatform::from_identifier(&platform.identifier);
        let legacy = if legacy.is_empty() { "-".to_string() } else { format!("0x{:x}", legacy.bits()) };
        println!("  {} [{}] legacy {}", platform.identifier, platform.tags_as_string(), legacy);
    }

    let mut registry = BuilderRegistry::new();
    if let Err(e) = register_recognizers(&mut registry, &config.recognizers, config.subid.overflow) {
        eprintln!("Error: {}", e);
        return ExitCode::from(EXIT_ERROR);
    }

    println!("Recognizers ({}):", registry.len());
    let mut invalid = 0;
    for entry in registry.iter() {
        let patterns: Vec<String> = entry.descriptor.patterns.iter().map(|p| p.to_string()).collect();
        println!("  {} {}", entry.descriptor.name, patterns.join(" "));

        for matcher in entry.invalid_patterns() {
            eprintln!("    invalid pattern {}: {}", matcher.builder_pattern(), matcher.error_string());
            invalid += 1;
        }

        if let Some(recognizer) = config.recognizers.get(&entry.descriptor.name) {
            match recognizer.declared_sub_id(config.subid.overflow) {
                Ok(Some(sub_id)) => println!("    product sub id 0x{:08x}", sub_id),
                Ok(None) => {}
                Err(e) => {
                    eprintln!("    invalid product sub id: {}", e);
                    invalid += 1;
                }
            }

            let targets: Vec<&PlatformInfo> =
                platforms.iter().filter(|p| recognizer.params_for(p).is_some()).collect();
            if targets.is_empty() {
                println!("    builds for no platform");
            }
            for platform in targets {
                println!("    {}: {}", platform.identifier, recognizer.params_for(platform).unwrap_or_default());
            }
        }
    }

    if invalid > 0 {
        ExitCode::from(EXIT_ERROR)
    } else {
        println!("OK");
        ExitCode::from(EXIT_SUCCESS)
    }
}
