// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_snake_case)]

use crate::Utils::logger::save_curves_to_csv;
use crate::Utils::plots::plot_function;
use crate::expression::graph_engine::ExprGraph;
use crate::expression::graph_engine_eval::Environment;
use crate::expression::utils::linspace;
use log::{info, warn};
use simplelog::*;

// wrapper around the examples to implement logging
fn init_logging(loglevel: Option<String>) {
    let log_option = if let Some(level) = loglevel {
        match level.as_str() {
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            _ => panic!("loglevel must be debug, info, warn or error"),
        }
    } else {
        LevelFilter::Info
    };
    let _ = CombinedLogger::init(vec![TermLogger::new(
        log_option,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[allow(dead_code)]
pub fn graph_examples(example: usize) {
    init_logging(Some("info".to_string()));
    match example {
        0 => {
            // FUNCTION OF 1 VARIABLE: f(x) = sin(x)
            let g = ExprGraph::new();
            let x1 = g.var("x1");
            let y = x1.sin();
            info!("plotting {} and its derivative on [0, 10]", y);
            plot_function(&y, &x1, 0.0, 10.0, "f(x) = sin(x)", "sin_x.png");
        }
        1 => {
            // f(x) = exp(5 / x2) - 5, built with literal coercion on both sides
            let g = ExprGraph::new();
            let x2 = g.var("x2");
            let y = (g.constant(5.0) / x2.clone()).exp() - 5.0;
            // compare the forward derivative against the numerical one before plotting
            let (norma, ok) = y.compare_num1D(1.0, 3.0, 100, 1e-4);
            info!("derivative check: norm = {}, ok = {}", norma, ok);
            if !ok {
                warn!("analytical and numerical derivatives disagree");
            }
            plot_function(&y, &x2, 1.0, 3.0, "f(x) = exp(5 / x2) - 5", "exp_5_over_x.png");
        }
        2 => {
            // f(x) = exp(sin(x))
            let g = ExprGraph::new();
            let x3 = g.var("x3");
            let y = x3.sin().exp();
            plot_function(&y, &x3, 0.0, 10.0, "f(x) = exp(sin(x))", "exp_sin_x.png");
        }
        3 => {
            // SHARED SUBEXPRESSION: s is referenced by two parents and computed once per call
            let g = ExprGraph::new();
            let x = g.var("x");
            let s = x.clone() * x.clone() + 1.0;
            let y = s.clone() / x.clone() + s.clone();
            let mut env = Environment::new();
            env.bind(&x, 2.0);
            let (res, stats) = y.eval_with_stats(&env).unwrap();
            info!(
                "y = {} evaluated to {} with {} operator applications and {} cache hits",
                y, res, stats.ops_applied, stats.cache_hits
            );
            let mesh = linspace(0.5, 4.0, 101);
            let f = y.calc_vector1D(&mesh);
            let df = y.calc_vector1D_d(&mesh);
            save_curves_to_csv(&mesh, &f, &df, "shared_subexpr.csv", "x").unwrap();
        }
        _ => {
            println!("there is no example with number {}", example);
        }
    }
}
