/// Tests for constraint aggregation
/// Pruning of empty entries, branch ordering, constants alignment and evaluation functions
#[cfg(test)]
mod aggregation_tests {
    use approx::assert_relative_eq;
    use awe_ocp::constraints::{ConstraintStruct, Shape};
    use awe_ocp::{
        aggregate, ConstraintEntry, ConstraintKind, Diagnostic, Expr, Space, Symbol, TracingSink,
    };

    fn var(index: usize) -> Expr {
        Expr::symbol(Symbol::new(Space::Variables, index, format!("w[{index}]")))
    }

    fn entries() -> Vec<ConstraintEntry> {
        vec![
            ConstraintEntry::new("A", vec![]),
            ConstraintEntry::new("B", vec![var(0), var(1), var(2)]),
            ConstraintEntry::new("C", vec![]),
            ConstraintEntry::new("D", vec![var(3) * 2.0, Expr::one()]),
        ]
    }

    #[test]
    fn test_empty_entries_are_pruned_in_order() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let agg = aggregate("path", entries(), vec![], &mut sink).unwrap();

        let equality = agg.layout().equality.as_ref().unwrap();
        assert_eq!(equality.names(), vec!["B", "D"]);
        assert_eq!(equality.total_size(), 5);
        assert_eq!(equality.entry("D").unwrap().offset, 3);
        assert!(agg.layout().inequality.is_none());
        assert_eq!(agg.symbols.flatten(ConstraintKind::Equality).len(), 5);

        let dropped: Vec<&str> = sink.iter().map(|d| d.entry.as_str()).collect();
        assert_eq!(dropped, vec!["A", "C"]);
        assert!(sink.iter().all(|d| d.kind == ConstraintKind::Equality));
        assert_eq!(
            sink[0].message,
            "removing constraint entry (A) from eq branch, because it appears to be empty"
        );
    }

    #[test]
    fn test_aggregation_is_pruning_idempotent() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let first = aggregate("path", entries(), vec![], &mut sink).unwrap();

        let survivors: Vec<ConstraintEntry> = entries()
            .into_iter()
            .filter(|e| !e.is_degenerate())
            .collect();
        let mut second_sink: Vec<Diagnostic> = Vec::new();
        let second = aggregate("path", survivors, vec![], &mut second_sink).unwrap();

        assert_eq!(first, second);
        assert!(second_sink.is_empty());
    }

    #[test]
    fn test_branch_function_concatenates_entries() {
        let mut sink = TracingSink;
        let agg = aggregate("path", entries(), vec![], &mut sink).unwrap();
        assert_eq!(agg.functions.equality.name(), "path_equality");
        assert_eq!(agg.functions.inequality.name(), "path_inequality");

        let out = agg
            .functions
            .get(ConstraintKind::Equality)
            .call(&[1.0, 2.0, 3.0, 4.0], &[])
            .unwrap();
        assert_eq!(out.to_vec(), vec![1.0, 2.0, 3.0, 8.0, 1.0]);
        assert!(agg
            .functions
            .get(ConstraintKind::Inequality)
            .call(&[], &[])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_constants_align_with_inequality_entries() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let inequalities = vec![
            ConstraintEntry::new("path_bound", vec![var(0), var(1)]),
            ConstraintEntry::new("terminal_battery", vec![var(2)]).with_constant(vec![2024.64]),
        ];
        let agg = aggregate("integral", vec![], inequalities, &mut sink).unwrap();

        let constants = agg.constants.as_ref().unwrap();
        assert_eq!(
            constants.flatten(ConstraintKind::Inequality),
            &[0.0, 0.0, 2024.64]
        );
        let battery = constants
            .entry(ConstraintKind::Inequality, "terminal_battery")
            .unwrap();
        assert_relative_eq!(battery[0], 2024.64);
        assert!(constants.entry(ConstraintKind::Equality, "terminal_battery").is_none());
    }

    #[test]
    fn test_matrix_entries_keep_their_shape() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let matrix = ConstraintEntry::with_shape(
            "tether_forces",
            Shape::new(2, 2),
            vec![var(0), var(1), var(2), var(3)],
        )
        .unwrap();
        let flat = ConstraintEntry::with_shape("none", Shape::new(0, 3), vec![]).unwrap();
        let agg = aggregate("dyn", vec![], vec![flat, matrix], &mut sink).unwrap();

        let inequality = agg.layout().inequality.as_ref().unwrap();
        assert_eq!(inequality.entry("tether_forces").unwrap().shape, Shape::new(2, 2));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].kind, ConstraintKind::Inequality);
    }

    #[test]
    fn test_struct_rejects_wrong_length() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let agg = aggregate("path", entries(), vec![], &mut sink).unwrap();
        let layout = agg.layout().clone();
        let err = ConstraintStruct::new(layout, vec![0.0; 4], vec![]).unwrap_err();
        assert_eq!(err.to_string(), "expected 5 values for 'eq', got 4");
    }
}
