//! Configuration system demonstration
//!
//! Usage: `cargo run -p lod-config --example demo [path/to/lod.yaml]`

use lod_config::{quality_profile, ConfigFormat, ConfigParser, ConfigSerializer, LodConfig};
use lod_shared::{LodStage, QualityLevel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Adaptive LOD Configuration Demo\n");

    let config = match std::env::args().nth(1) {
        Some(path) => ConfigParser::parse_file(path)?,
        None => LodConfig::default(),
    };

    println!("Quality loop:");
    println!("  Auto-adjust: {}", config.quality.auto_adjust_enabled);
    println!(
        "  Downgrade below {} fps, upgrade above {:.1} fps",
        config.quality.min_fps,
        config.quality.upgrade_threshold_fps()
    );
    println!("  Cooldown: {} ms", config.quality.cooldown_ms);
    println!();

    println!("Stage policies:");
    for stage in LodStage::ALL {
        let policy = config.stages.policy(stage);
        println!(
            "  {:<12} <= {:>6} elements, {:>5} ms budget, {:>5} B/element",
            stage.to_string(),
            policy.max_elements,
            policy.load_budget_ms,
            policy.bytes_per_element
        );
    }
    println!();

    println!("Quality presets:");
    for level in QualityLevel::ALL {
        let profile = quality_profile(level);
        println!(
            "  {:<8} scale {:.2}, AA {:?}, shadows {}, AO {}",
            level.to_string(),
            profile.resolution_scale,
            profile.antialiasing,
            profile.shadows,
            profile.ambient_occlusion
        );
    }
    println!();

    let yaml = ConfigSerializer::serialize_string(&config, ConfigFormat::Yaml)?;
    println!("Exported configuration (first 500 chars):");
    println!("{}", &yaml[..yaml.len().min(500)]);
    println!("...");

    Ok(())
}
