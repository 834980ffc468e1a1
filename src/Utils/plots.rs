use crate::expression::graph_engine::Expr;
use crate::expression::graph_engine_eval::Environment;
use crate::expression::utils::linspace;
use plotters::prelude::*;

/// Samples `eval` and `d` of the expression over a linspace of the variable and
/// renders both curves into a PNG file.
///
/// # Panics
/// Panics if a variable of the expression is unresolvable through `x`, or on
/// file-system errors.
pub fn plot_function(
    y: &Expr,
    x: &Expr,
    start_val: f64,
    end_val: f64,
    description: &str,
    filename: &str,
) {
    let plot_x = linspace(start_val, end_val, 1001);
    let mut plot_y = Vec::with_capacity(plot_x.len());
    let mut plot_yd = Vec::with_capacity(plot_x.len());
    for &v in &plot_x {
        let mut env = Environment::new();
        env.bind(x, v);
        plot_y.push(y.eval(&env).unwrap());
        plot_yd.push(y.d(&env).unwrap());
    }

    let y_min = plot_y
        .iter()
        .chain(plot_yd.iter())
        .cloned()
        .fold(f64::INFINITY, f64::min);
    let y_max = plot_y
        .iter()
        .chain(plot_yd.iter())
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);

    let root_area = BitMapBackend::new(filename, (800, 600)).into_drawing_area();
    root_area.fill(&WHITE).unwrap();

    // Create a chart builder
    let mut chart = ChartBuilder::on(&root_area)
        .caption(description, ("sans-serif", 50))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(30)
        .build_cartesian_2d(start_val..end_val, y_min..y_max)
        .unwrap();

    // Configure the mesh
    chart
        .configure_mesh()
        .x_desc("x")
        .y_desc("f(x)")
        .draw()
        .unwrap();

    // Plot the function and its derivative
    let series_f: Vec<(f64, f64)> = plot_x
        .iter()
        .zip(plot_y.iter())
        .map(|(&x, &y)| (x, y))
        .collect();
    chart
        .draw_series(LineSeries::new(series_f, &Palette99::pick(0)))
        .unwrap()
        .label("f(x)")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &Palette99::pick(0)));

    let series_df: Vec<(f64, f64)> = plot_x
        .iter()
        .zip(plot_yd.iter())
        .map(|(&x, &y)| (x, y))
        .collect();
    chart
        .draw_series(LineSeries::new(series_df, &Palette99::pick(1)))
        .unwrap()
        .label("f'(x)")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &Palette99::pick(1)));

    // Configure the legend
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .unwrap();

    root_area.present().unwrap();
}
