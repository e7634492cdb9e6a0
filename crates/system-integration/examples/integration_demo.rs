//! Adaptive LOD controller demonstration
//!
//! Probes a described render context, loads a synthetic structure stage by
//! stage, then simulates a slow render loop so the quality controller steps
//! down.

use async_trait::async_trait;
use futures::StreamExt;
use lod_integration::{
    AdaptiveLodController, ContextSnapshot, ControllerEvent, DeviceClassHint, ElementSubset,
    GeometryBuilder, GraphicsApi, LodConfig,
};
use lod_shared::{LodResult, LodStage, Structure};
use std::sync::Arc;
use std::time::Duration;

/// Stand-in for a mesh builder: one sphere of 24 vertices per element
struct SphereBuilder;

#[async_trait]
impl GeometryBuilder for SphereBuilder {
    type Geometry = usize;

    async fn build(&self, subset: ElementSubset) -> LodResult<usize> {
        tokio::time::sleep(Duration::from_millis(subset.len() as u64 / 500)).await;
        Ok(subset.len() * 24)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Adaptive LOD Controller Demo\n");

    let context = ContextSnapshot {
        api: Some(GraphicsApi::WebGl2),
        max_texture_dimension: Some(8_192),
        max_buffer_size: Some(1024 * 1024 * 1024),
        memory_hint_mb: Some(8_192),
        device_class: Some(DeviceClassHint::Integrated),
    };

    let mut controller = AdaptiveLodController::new(LodConfig::default(), &context, SphereBuilder)?;
    let events = controller.subscribe();

    println!("Session {}", controller.session_id());
    println!(
        "Device tier: {} ({})",
        controller.capability().tier,
        controller.probe_report().limiting_factor
    );
    println!("Starting quality: {}\n", controller.quality_level());

    let structure = Arc::new(Structure::synthetic(60_000));
    let mut load = controller.load_progressive(structure, LodStage::Full);
    println!("Load plan: {:?}", load.plan().stages());

    while let Some(stage) = load.next().await {
        match stage {
            Ok(output) => println!(
                "  {} stage: {} elements, {} vertices in {} ms{}",
                output.result.stage,
                output.result.element_count,
                output.geometry,
                output.result.elapsed_ms,
                if output.result.met_budget { "" } else { " (over budget)" }
            ),
            Err(err) => println!("  stage failed: {}", err),
        }
    }
    if let Some(outcome) = load.outcome() {
        println!("Load {}\n", outcome.status_message());
    }

    // Simulate 2 seconds of a renderer struggling at ~22 fps
    let quality_loop = controller.spawn_quality_loop();
    for _ in 0..45 {
        controller.record_frame(45.0, 850, 2_400_000, 300 * 1024 * 1024);
        tokio::time::sleep(Duration::from_millis(45)).await;
    }
    let ticks = quality_loop.shutdown().await;
    println!("Quality loop ran {} ticks", ticks);

    for event in events.try_iter() {
        if let ControllerEvent::QualityChanged(change) = event {
            println!(
                "Quality {} -> {} ({})",
                change.previous_level, change.new_level, change.reason
            );
        }
    }

    let diagnostics = controller.diagnostics();
    println!("\n{}", diagnostics.summary());
    println!("Bottleneck: {}", diagnostics.bottleneck.recommendation);
    println!("\nDiagnostics:\n{}", diagnostics.to_json()?);

    Ok(())
}
