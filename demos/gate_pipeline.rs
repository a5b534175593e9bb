//! Example gating a synthetic bead acquisition.
//!
//! This example shows how to:
//! 1. Create synthetic events with instrument metadata
//! 2. Apply a single density gate and inspect its contours
//! 3. Run a multi-step pipeline
//! 4. Export the pipeline as YAML

use flowgate::prelude::*;

fn main() -> Result<()> {
    println!("=== flowgate Example ===\n");

    let events = create_example_data()?;
    println!("Data dimensions:");
    println!("  Events:   {}", events.n_rows());
    println!("  Channels: {}", events.channels().join(", "));
    println!();

    // A single density gate on the scatter channels
    println!("=== Density Gate ===\n");

    let gate = Density2dGate::new(ChannelSelector::pair("FSC-H", "SSC-H"))
        .with_bins(BinSpec::Count(64))
        .with_fraction(0.5)
        .with_sigma(2.0);
    let output = gate.apply(&events)?;
    println!("{}", output);

    for (i, contour) in output.contours.iter().enumerate() {
        let closed = if contour.is_closed() { "closed" } else { "open" };
        println!("  contour {}: {} vertices ({})", i, contour.len(), closed);
    }
    println!();

    // The full pipeline
    println!("=== Running Pipeline ===\n");

    let pipeline = Pipeline::new()
        .name("beads")
        .start_end(250, 100)
        .high_low(None, None, None)
        .density2d(
            ChannelSelector::pair("FSC-H", "SSC-H"),
            BinSpec::Auto,
            0.65,
            10.0,
        )
        .ellipse(
            EllipseGate::new(ChannelSelector::pair("FL1-H", "FL2-H"), [2.0, 2.0], 0.4, 0.3)
                .with_log(true),
        );

    let result = pipeline.run(&events)?;
    println!("{}", result);

    println!("=== Pipeline Configuration (YAML) ===\n");
    let config = pipeline.to_config(Some("Trim, bound, density and fluorescence gating"));
    println!("{}", config.to_yaml()?);

    Ok(())
}

/// Two scatter channels with a dense bead population on a sparse debris
/// background, plus two log-normal fluorescence channels.
fn create_example_data() -> Result<PointSet> {
    let n_events = 5000;
    let mut seed = 12345u64;

    let mut rand_uniform = || -> f64 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((seed >> 11) as f64) / (1u64 << 53) as f64
    };

    let mut data = Vec::with_capacity(n_events * 4);
    for i in 0..n_events {
        let (fsc, ssc) = if i % 5 == 0 {
            (1023.0 * rand_uniform(), 1023.0 * rand_uniform())
        } else {
            (
                500.0 + 80.0 * (rand_uniform() - 0.5),
                400.0 + 60.0 * (rand_uniform() - 0.5),
            )
        };
        let fl1 = 10f64.powf(2.0 + 0.3 * (rand_uniform() - 0.5));
        let fl2 = 10f64.powf(2.0 + 0.2 * (rand_uniform() - 0.5));
        data.extend_from_slice(&[fsc, ssc, fl1, fl2]);
    }

    let channels = ["FSC-H", "SSC-H", "FL1-H", "FL2-H"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let scatter = ChannelInfo {
        range: Some((0.0, 1023.0)),
        bin_edges: Some((0..=128).map(|i| i as f64 * 1023.0 / 128.0).collect()),
    };

    PointSet::new(data, channels)?
        .with_channel_info(0, scatter.clone())?
        .with_channel_info(1, scatter)
}
