//___________________________________TESTS____________________________________

#[cfg(test)]
mod tests {
    use crate::expression::graph_engine::ExprGraph;
    use crate::expression::graph_engine_eval::{Environment, ExprError};
    use crate::symbols;
    use std::collections::HashMap;

    #[test]
    fn test_subtraction_of_constants() {
        let g = ExprGraph::new();
        let c1 = g.constant(1.0);
        let c2 = g.constant(5.0);
        let y = c1 - c2;
        assert_eq!(y.eval(&Environment::new()).unwrap(), -4.0);
    }

    #[test]
    fn test_casted_constants_left() {
        let g = ExprGraph::new();
        let c1 = g.constant(1.0);
        let env = Environment::new();
        assert_eq!((c1.clone() - 5.0).eval(&env).unwrap(), -4.0);
        assert_eq!((c1.clone() - 1.0).eval(&env).unwrap(), 0.0);
        assert_eq!((c1.clone() - (-5.0)).eval(&env).unwrap(), 6.0);
    }

    #[test]
    fn test_casted_constants_right() {
        let g = ExprGraph::new();
        let c1 = g.constant(1.0);
        let env = Environment::new();
        assert_eq!((5.0 - c1.clone()).eval(&env).unwrap(), 4.0);
        assert_eq!((1.0 - c1.clone()).eval(&env).unwrap(), 0.0);
        assert_eq!(((-5.0) - c1.clone()).eval(&env).unwrap(), -6.0);
    }

    #[test]
    fn test_add_assign() {
        let g = ExprGraph::new();
        let mut expr = g.var("x");
        expr += g.constant(2.0);
        assert_eq!(format!("{}", expr), "(x + 2)");
    }

    #[test]
    fn test_sub_assign() {
        let g = ExprGraph::new();
        let mut expr = g.var("x");
        expr -= g.constant(2.0);
        assert_eq!(format!("{}", expr), "(x - 2)");
    }

    #[test]
    fn test_mul_assign() {
        let g = ExprGraph::new();
        let mut expr = g.var("x");
        expr *= g.constant(2.0);
        assert_eq!(format!("{}", expr), "(x * 2)");
    }

    #[test]
    fn test_div_assign() {
        let g = ExprGraph::new();
        let mut expr = g.var("x");
        expr /= g.constant(2.0);
        assert_eq!(format!("{}", expr), "(x / 2)");
    }

    #[test]
    fn test_neg() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let neg_expr = -x.clone();
        assert_eq!(format!("{}", neg_expr), "(-1 * x)");
        let mut env = Environment::new();
        env.bind(&x, 3.0);
        assert_eq!(neg_expr.eval(&env).unwrap(), -3.0);
    }

    #[test]
    fn test_combined_operations() {
        let g = ExprGraph::new();
        let mut expr = g.var("x");
        expr += g.constant(2.0);
        expr *= g.constant(3.0);
        expr -= g.constant(1.0);
        expr /= g.constant(2.0);
        assert_eq!(format!("{}", expr), "((((x + 2) * 3) - 1) / 2)");
        let mut env = Environment::new();
        env.bind_name("x", 2.0);
        assert_eq!(expr.eval(&env).unwrap(), 5.5);
    }

    #[test]
    fn test_memoization_of_shared_subexpression() {
        let g = ExprGraph::new();
        let a = g.var("a");
        let b = g.var("b");
        // one subexpression referenced by two parents
        let s = a.clone() * b.clone();
        let y = s.clone() + s.clone();
        let mut env = Environment::new();
        env.bind(&a, 3.0);
        env.bind(&b, 4.0);
        let (res, stats) = y.eval_with_stats(&env).unwrap();
        assert_eq!(res, 24.0);
        // one Mul and one Add - the shared Mul is computed once per call
        assert_eq!(stats.ops_applied, 2);
        assert_eq!(stats.cache_hits, 1);

        // same result as if s were duplicated into two independent nodes
        let m1 = a.clone() * b.clone();
        let m2 = a.clone() * b.clone();
        let y_duplicated = m1 + m2;
        let (res2, stats2) = y_duplicated.eval_with_stats(&env).unwrap();
        assert_eq!(res2, res);
        assert_eq!(stats2.ops_applied, 3);
    }

    #[test]
    fn test_deep_diamond_evaluates_linearly() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let mut s = x.clone() + 1.0;
        for _ in 0..20 {
            s = s.clone() + s.clone();
        }
        let mut env = Environment::new();
        env.bind(&x, 1.0);
        let (res, stats) = s.eval_with_stats(&env).unwrap();
        // 2^20 references to the innermost (x + 1), but 21 additions in total
        assert_eq!(res, 2097152.0);
        assert_eq!(stats.ops_applied, 21);
        assert_eq!(stats.cache_hits, 20);
        // the derivative pass is linear as well
        assert_eq!(s.d(&env).unwrap(), 1048576.0);
    }

    #[test]
    fn test_derivative_of_variable_is_one() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let mut env = Environment::new();
        env.bind(&x, 7.0);
        assert_eq!(x.d(&env).unwrap(), 1.0);
    }

    #[test]
    fn test_derivative_of_constant_is_zero() {
        let g = ExprGraph::new();
        let k = g.constant(42.0);
        assert_eq!(k.d(&Environment::new()).unwrap(), 0.0);
    }

    #[test]
    fn test_derivative_of_sum() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let y = x.clone() + x.clone();
        let mut env = Environment::new();
        env.bind(&x, 11.0);
        assert_eq!(y.d(&env).unwrap(), 2.0);
    }

    #[test]
    fn test_derivative_of_difference() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let y = x.clone() * x.clone() - x.clone();
        let mut env = Environment::new();
        env.bind(&x, 3.0);
        // d(x*x - x) = 2*x - 1
        assert_eq!(y.d(&env).unwrap(), 5.0);
    }

    #[test]
    fn test_product_rule() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let y = x.clone() * x.clone();
        let mut env = Environment::new();
        env.bind(&x, 3.0);
        assert_eq!(y.d(&env).unwrap(), 6.0);
    }

    #[test]
    fn test_quotient_rule() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let k = g.constant(2.0);
        let y = k / x.clone();
        let mut env = Environment::new();
        env.bind(&x, 4.0);
        // d(k/x) = -k / x^2
        assert_eq!(y.d(&env).unwrap(), -0.125);
    }

    #[test]
    fn test_derivative_memoizes_shared_subexpression() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let s = x.clone() * x.clone();
        let y = s.clone() + s.clone();
        let mut env = Environment::new();
        env.bind(&x, 3.0);
        // d(s + s) = 2 * d(s) = 2 * 2x = 12
        let (res, stats) = y.d_with_stats(&env).unwrap();
        assert_eq!(res, 12.0);
        // the shared Mul is differentiated once, its second reference is a cache hit
        assert!(stats.cache_hits >= 1);
    }

    #[test]
    fn test_unbound_variable_on_eval() {
        let g = ExprGraph::new();
        let x3 = g.var("x3");
        let y = x3.clone() * x3.clone() + 1.0;
        let err = y.eval(&Environment::new()).unwrap_err();
        assert_eq!(err, ExprError::UnboundVariable("x3".to_string()));
        assert_eq!(format!("{}", err), "Unbound variable x3");
    }

    #[test]
    fn test_unbound_variable_on_derivative() {
        let g = ExprGraph::new();
        let x3 = g.var("x3");
        // the product rule evaluates operand values, so the missing binding aborts d too
        let y = x3.clone() * x3.clone();
        let err = y.d(&Environment::new()).unwrap_err();
        assert_eq!(err, ExprError::UnboundVariable("x3".to_string()));
    }

    #[test]
    fn test_eval_is_idempotent() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let y = (x.clone() * x.clone() + 3.0) / x.clone();
        let mut env = Environment::new();
        env.bind(&x, 2.0);
        let first = y.eval(&env).unwrap();
        let second = y.eval(&env).unwrap();
        assert_eq!(first, second);
        // per-call caches do not leak into the graph: no nodes were allocated
        let nodes_before = g.len();
        let _ = y.eval(&env).unwrap();
        let _ = y.d(&env).unwrap();
        assert_eq!(g.len(), nodes_before);
    }

    #[test]
    fn test_instance_binding_takes_precedence_over_name() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let mut env = Environment::new();
        env.bind(&x, 10.0);
        env.bind_name("x", 99.0);
        assert_eq!(x.eval(&env).unwrap(), 10.0);
    }

    #[test]
    fn test_variables_of_same_name_are_distinct_instances() {
        let g = ExprGraph::new();
        let x1 = g.var("x");
        let x2 = g.var("x");
        assert!(x1 != x2);
        let y = x1.clone() + x2.clone();
        let mut env = Environment::new();
        env.bind(&x1, 1.0);
        env.bind(&x2, 2.0);
        assert_eq!(y.eval(&env).unwrap(), 3.0);
        // without instance bindings both fall back to the same name binding
        let mut env2 = Environment::new();
        env2.bind_name("x", 5.0);
        assert_eq!(y.eval(&env2).unwrap(), 10.0);
    }

    #[test]
    fn test_needs_grad_propagation() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let y = g.var("y");
        let k = g.constant(2.0);
        assert!(x.needs_grad());
        assert!(!k.needs_grad());
        // AND of both children's flags at construction time
        assert!((x.clone() + y.clone()).needs_grad());
        assert!(!(x.clone() * k.clone()).needs_grad());
        assert!(!(x.clone() + 1.0).needs_grad());
        assert!(x.clone().exp().needs_grad());
        assert!(!g.var_no_grad("z").needs_grad());
    }

    #[test]
    fn test_division_by_zero_propagates() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let mut env = Environment::new();
        env.bind(&x, 0.0);
        // not converted into an error kind - inf/NaN reach the caller
        let y = g.constant(1.0) / x.clone();
        assert!(y.eval(&env).unwrap().is_infinite());
        let z = x.clone() / x.clone();
        assert!(z.eval(&env).unwrap().is_nan());
    }

    #[test]
    fn test_unary_functions_eval() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let mut env = Environment::new();
        env.bind(&x, 2.0);
        approx::assert_relative_eq!(x.clone().exp().eval(&env).unwrap(), 2.0f64.exp());
        approx::assert_relative_eq!(x.clone().ln().eval(&env).unwrap(), 2.0f64.ln());
        approx::assert_relative_eq!(x.clone().sin().eval(&env).unwrap(), 2.0f64.sin());
        approx::assert_relative_eq!(x.clone().cos().eval(&env).unwrap(), 2.0f64.cos());
    }

    #[test]
    fn test_unary_functions_chain_rule() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let v: f64 = 1.3;
        let mut env = Environment::new();
        env.bind(&x, v);
        approx::assert_relative_eq!(x.clone().exp().d(&env).unwrap(), v.exp());
        approx::assert_relative_eq!(x.clone().ln().d(&env).unwrap(), 1.0 / v);
        approx::assert_relative_eq!(x.clone().sin().d(&env).unwrap(), v.cos());
        approx::assert_relative_eq!(x.clone().cos().d(&env).unwrap(), -v.sin());
        // chain through a composite argument: d(exp(sin(x))) = exp(sin(x)) * cos(x)
        approx::assert_relative_eq!(
            x.clone().sin().exp().d(&env).unwrap(),
            v.sin().exp() * v.cos()
        );
    }

    #[test]
    fn test_total_derivative_sums_over_all_variables() {
        let g = ExprGraph::new();
        let x1 = g.var("x1");
        let x2 = g.var("x2");
        let y = x1.clone() * x2.clone();
        let mut env = Environment::new();
        env.bind(&x1, 2.0);
        env.bind(&x2, 3.0);
        // every bound variable contributes with derivative 1:
        // the result is x1 + x2, not a partial with respect to one of them
        assert_eq!(y.d(&env).unwrap(), 5.0);
    }

    #[test]
    fn test_compare_num1D() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let y = (g.constant(5.0) / x.clone()).exp() - 5.0;
        let (norma, ok) = y.compare_num1D(1.0, 3.0, 100, 1e-4);
        println!("norm = {}, res = {}", norma, ok);
        assert!(ok);

        let g2 = ExprGraph::new();
        let x2 = g2.var("x");
        let (norma2, ok2) = x2.sin().compare_num1D(0.0, 10.0, 100, 1e-6);
        println!("norm = {}, res = {}", norma2, ok2);
        assert!(ok2);
    }

    #[test]
    fn test_construction_of_expression() {
        let g = ExprGraph::new();
        let vars = g.Symbols("a, b, c");
        assert_eq!(vars.len(), 3);
        let (a, b, c) = (vars[0].clone(), vars[1].clone(), vars[2].clone());
        let expr = a * b + c;
        let env = Environment::from_pairs(&[("a", 2.0), ("b", 3.0), ("c", 4.0)]);
        assert_eq!(expr.eval(&env).unwrap(), 10.0);
    }

    #[test]
    fn test_symbols_macro() {
        let g = ExprGraph::new();
        let (x, y) = symbols!(g; x, y);
        let expr = x + y;
        let env = Environment::from_pairs(&[("x", 1.0), ("y", 2.0)]);
        assert_eq!(expr.eval(&env).unwrap(), 3.0);
    }

    #[test]
    fn test_variable_names() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let y = g.var("y");
        let expr = (x.clone() + y.clone()) * x.clone();
        assert_eq!(expr.variable_names(), vec!["x".to_string(), "y".to_string()]);
        assert!(expr.contains_variable("x"));
        assert!(!expr.contains_variable("z"));
    }

    #[test]
    fn test_display() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let y = g.var("y");
        let expr = (x.clone() + 2.0) * y.clone();
        assert_eq!(format!("{}", expr), "((x + 2) * y)");
        assert_eq!(format!("{}", x.clone().exp()), "exp(x)");
        assert_eq!(format!("{}", x.clone().sin()), "sin(x)");
    }

    #[test]
    fn test_environment_from_hashmap() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let mut map = HashMap::new();
        map.insert("x".to_string(), 4.0);
        let env = Environment::from(map);
        assert_eq!(x.eval(&env).unwrap(), 4.0);
    }

    #[test]
    fn test_lambdify1D() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let f = x.clone() * x.clone();
        let fn_closure = f.lambdify1D();
        assert_eq!(fn_closure(2.0), 4.0);
        let df_closure = f.lambdify1D_d();
        assert_eq!(df_closure(2.0), 4.0);
    }

    #[test]
    fn test_calc_from_linspace_parallel_matches_serial() {
        let g = ExprGraph::new();
        let x = g.var("x");
        let y = x.clone().sin().exp();
        let serial = y.calc_from_linspace(0.0, 10.0, 101);
        let parallel = y.calc_vector1D_parallel(&crate::expression::utils::linspace(0.0, 10.0, 101));
        assert_eq!(serial, parallel);
    }

    #[test]
    #[should_panic(expected = "different expression graphs")]
    fn test_cross_graph_composition_panics() {
        let g1 = ExprGraph::new();
        let g2 = ExprGraph::new();
        let x = g1.var("x");
        let y = g2.var("y");
        let _ = x + y;
    }
}
