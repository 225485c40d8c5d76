use console::Style;
use soma_core::pipeline::config::PipelineConfig;
use soma_core::separate::MethodMetrics;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_pipeline_summary(config: &PipelineConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Soma Pipeline"));
    println!("  {}", s.title.apply_to("\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}"));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output_dir.display())
    );
    println!();

    println!("  {}", s.header.apply_to("Motion Correction"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Template"),
        s.value.apply_to(format!(
            "top {:.0}%, {} refinement pass(es)",
            config.motion.template_fraction * 100.0,
            config.motion.template_iterations
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Smoothing"),
        s.value.apply_to(format!(
            "median {} then sigma {}",
            config.motion.median_window, config.motion.smoothing_sigma
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Max jump"),
        s.value.apply_to(format!("{} px", config.motion.max_jump))
    );
    println!();

    println!("  {}", s.header.apply_to("Separation"));
    let method_names: Vec<String> = config
        .separation
        .methods
        .iter()
        .map(|m| m.to_string())
        .collect();
    println!(
        "    {:<12}{}",
        s.label.apply_to("Methods"),
        s.method.apply_to(method_names.join(", "))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Components"),
        s.value.apply_to(config.separation.k)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Normalize"),
        if config.separation.normalize_variance {
            s.value.apply_to("per-pixel variance".to_string())
        } else {
            s.disabled.apply_to("off".to_string())
        }
    );
    println!();

    match config.sweep {
        Some(ref sweep) => {
            println!("  {}", s.header.apply_to("Stability Sweep"));
            println!(
                "    {:<12}{:?}",
                s.label.apply_to("Ranks"),
                sweep.ranks
            );
            println!(
                "    {:<12}{:?}",
                s.label.apply_to("Alphas"),
                sweep.alphas
            );
            println!(
                "    {:<12}{}",
                s.label.apply_to("Runs"),
                s.value.apply_to(sweep.runs)
            );
        }
        None => {
            println!(
                "  {:<14}{}",
                s.header.apply_to("Stability Sweep"),
                s.disabled.apply_to("disabled")
            );
        }
    }
    println!();
}

pub fn print_metrics_table(metrics: &[MethodMetrics]) {
    println!(
        "\n{:<16}  {:>10}  {:>8}  {:>9}  {:>9}  {:>10}  {:>6}",
        "Method", "RMSE", "ExplVar", "Sparsity", "Compact", "Roughness", "Iter"
    );
    println!("{}", "-".repeat(80));

    for m in metrics {
        println!(
            "{:<16}  {:>10.6}  {:>8.4}  {:>9.4}  {:>9.4}  {:>10.4}  {:>6}",
            m.method.to_string(),
            m.rmse,
            m.explained_variance,
            m.spatial_sparsity,
            m.spatial_compactness,
            m.temporal_roughness,
            m.iterations
        );
    }
}
