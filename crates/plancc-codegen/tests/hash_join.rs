//! Hash join code generation: build side materialized before probing

use plancc_codegen::prelude::*;
use plancc_codegen::translators::JoinSide;

fn tpch_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .add_relation(
            Relation::new(
                "nation",
                25,
                vec![
                    Attribute::new("n_nationkey", TypeDescriptor::Integer),
                    Attribute::new("n_regionkey", TypeDescriptor::Integer),
                    Attribute::new("n_name", TypeDescriptor::Char { length: 25 }),
                ],
            )
            .unwrap(),
        )
        .unwrap();
    catalog
        .add_relation(
            Relation::new(
                "region",
                5,
                vec![
                    Attribute::new("r_regionkey", TypeDescriptor::Integer),
                    Attribute::new("r_name", TypeDescriptor::Char { length: 25 }),
                ],
            )
            .unwrap(),
        )
        .unwrap();
    catalog
}

/// Probe relation is declared before the build relation on purpose
fn nation_region_join() -> (Plan, NodeId, NodeId, NodeId) {
    let mut b = PlanBuilder::new();
    let probe = b.scan("region");
    let build = b.scan("nation");
    let join = b.hash_join(build, probe, "n_regionkey", "r_regionkey").unwrap();
    let print = b.print(join, ["n_name", "r_name"]).unwrap();
    (b.finish(print).unwrap(), build, probe, join)
}

#[test]
fn test_build_loop_completes_before_probe() {
    let (plan, _, _, _) = nation_region_join();
    let catalog = tpch_catalog();
    let registry = builtin_registry().freeze();
    let code = Translator::new(&plan, &registry, &catalog).translate().unwrap();

    let expected = "\
let mut ht2 = HashMap::new();
let col1_n_nationkey = db.relation(\"nation\").column::<types::Integer>(\"n_nationkey\");
let col1_n_regionkey = db.relation(\"nation\").column::<types::Integer>(\"n_regionkey\");
let col1_n_name = db.relation(\"nation\").column::<types::Char<25>>(\"n_name\");
for tid1 in 0..25 {
    let n_nationkey = col1_n_nationkey[tid1];
    let n_regionkey = col1_n_regionkey[tid1];
    let n_name = col1_n_name[tid1];
    ht2.entry(n_regionkey).or_insert_with(Vec::new).push((n_nationkey, n_regionkey, n_name));
}
let col0_r_regionkey = db.relation(\"region\").column::<types::Integer>(\"r_regionkey\");
let col0_r_name = db.relation(\"region\").column::<types::Char<25>>(\"r_name\");
for tid0 in 0..5 {
    let r_regionkey = col0_r_regionkey[tid0];
    let r_name = col0_r_name[tid0];
    if let Some(matches2) = ht2.get(&r_regionkey) {
        for (n_nationkey, n_regionkey, n_name) in matches2.iter().cloned() {
            println!(\"{}|{}\", n_name, r_name);
        }
    }
}
";
    assert_eq!(code.render(), expected);

    let insert = code.position("ht2.entry(").unwrap();
    let build_close = insert + 1;
    let first_probe = code.position("col0_").unwrap();
    assert!(build_close < first_probe);
    assert_eq!(code.lines()[build_close].text, "}");
}

#[test]
fn test_join_side_of_source() {
    let (plan, build, probe, join) = nation_region_join();
    assert_eq!(JoinSide::of(&plan, join, build).unwrap(), JoinSide::Build);
    assert_eq!(JoinSide::of(&plan, join, probe).unwrap(), JoinSide::Probe);
    assert!(JoinSide::of(&plan, join, plan.root()).is_err());
}

#[test]
fn test_join_key_must_exist_on_its_side() {
    let mut b = PlanBuilder::new();
    let build = b.scan("nation");
    let probe = b.scan("region");
    // Key taken from the wrong side
    let join = b.hash_join(build, probe, "r_regionkey", "n_regionkey").unwrap();
    let print = b.print(join, ["n_name"]).unwrap();
    let plan = b.finish(print).unwrap();

    let catalog = tpch_catalog();
    let registry = builtin_registry().freeze();
    let err = Translator::new(&plan, &registry, &catalog).translate().unwrap_err();
    assert!(matches!(
        err,
        CodegenError::UnknownAttribute { ref attribute, .. } if attribute == "r_regionkey"
    ));
}

#[test]
fn test_self_join_with_shared_names_rejected() {
    let mut b = PlanBuilder::new();
    let build = b.scan("nation");
    let probe = b.scan("nation");
    let join = b.hash_join(build, probe, "n_nationkey", "n_regionkey").unwrap();
    let print = b.print(join, ["n_name"]).unwrap();
    let plan = b.finish(print).unwrap();

    let catalog = tpch_catalog();
    let registry = builtin_registry().freeze();
    let translator = Translator::new(&plan, &registry, &catalog);

    let err = translator.translate().unwrap_err();
    assert!(matches!(
        err,
        CodegenError::AmbiguousAttribute { node, ref attribute }
            if node == join && attribute == "n_nationkey"
    ));

    // Rejected before the build loop is emitted
    let mut buffer = CodeBuffer::new();
    assert!(translator.produce(plan.root(), &mut buffer).is_err());
    assert!(buffer.is_empty());
}

#[test]
fn test_pipeline_above_join_runs_per_match() {
    let mut b = PlanBuilder::new();
    let build = b.scan("nation");
    let probe = b.scan("region");
    let join = b.hash_join(build, probe, "n_regionkey", "r_regionkey").unwrap();
    let predicate = Expr::binary(
        BinOp::Ne,
        Expr::column("n_nationkey"),
        Expr::literal("0", TypeDescriptor::Integer),
    );
    let filter = b.filter(join, predicate).unwrap();
    let print = b.print(filter, ["n_name"]).unwrap();
    let plan = b.finish(print).unwrap();

    let catalog = tpch_catalog();
    let registry = builtin_registry().freeze();
    let code = Translator::new(&plan, &registry, &catalog).translate().unwrap();

    let match_loop = code.position("in matches2.iter().cloned()").unwrap();
    let condition = code.position("if n_nationkey != types::Integer(0) {").unwrap();
    let print_line = code.position("println!").unwrap();
    assert!(match_loop < condition && condition < print_line);
    assert_eq!(code.lines()[condition].depth, 3);
    assert_eq!(code.lines()[print_line].depth, 4);
}

#[test]
fn test_nested_joins_build_in_order() {
    let mut catalog = tpch_catalog();
    catalog
        .add_relation(
            Relation::new(
                "supplier",
                100,
                vec![
                    Attribute::new("s_suppkey", TypeDescriptor::Integer),
                    Attribute::new("s_nationkey", TypeDescriptor::Integer),
                ],
            )
            .unwrap(),
        )
        .unwrap();

    let mut b = PlanBuilder::new();
    let region = b.scan("region");
    let nation = b.scan("nation");
    let inner = b.hash_join(region, nation, "r_regionkey", "n_regionkey").unwrap();
    let supplier = b.scan("supplier");
    let outer = b.hash_join(inner, supplier, "n_nationkey", "s_nationkey").unwrap();
    let print = b.print(outer, ["s_suppkey", "r_name"]).unwrap();
    let plan = b.finish(print).unwrap();

    let registry = builtin_registry().freeze();
    let code = Translator::new(&plan, &registry, &catalog).translate().unwrap();

    let outer_ht = code.position("let mut ht4 = HashMap::new();").unwrap();
    let inner_ht = code.position("let mut ht2 = HashMap::new();").unwrap();
    let region_insert = code.position("ht2.entry(r_regionkey)").unwrap();
    let nation_probe = code.position("ht2.get(&n_regionkey)").unwrap();
    let outer_insert = code.position("ht4.entry(n_nationkey)").unwrap();
    let supplier_loop = code.position("for tid3").unwrap();
    let outer_probe = code.position("ht4.get(&s_nationkey)").unwrap();

    assert!(outer_ht < inner_ht);
    assert!(inner_ht < region_insert && region_insert < nation_probe);
    assert!(nation_probe < outer_insert && outer_insert < supplier_loop);
    assert!(supplier_loop < outer_probe);
}
