//! Integration tests running generated plans against in-memory storage.

use std::sync::Arc;

use nexus_exec::catalog::{AttrType, FieldMeta, IndexMeta, TableMeta};
use nexus_exec::expr::{CompOp, Expression};
use nexus_exec::logical::{
    AggregateExpr, AggregateFunc, DeleteNode, ExplainNode, InsertNode, JoinNode, LogicalNode,
    OrderByNode, OrderUnit, PredicateNode, ProjectExpr, ProjectionNode, TableGetNode,
    UpdateAssignment, UpdateNode,
};
use nexus_exec::physical::{explain_tree, OperatorKind};
use nexus_exec::storage::{LockMode, MemoryStorage, TableStorage};
use nexus_exec::txn::Transaction;
use nexus_exec::{ExecutorConfig, PhysicalOperatorGenerator, Tuple, Value};

struct Fixture {
    storage: Arc<MemoryStorage>,
    users: Arc<TableMeta>,
    depts: Arc<TableMeta>,
    txn: Transaction,
}

fn fixture() -> Fixture {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let users = Arc::new(
        TableMeta::new("users")
            .with_field(FieldMeta::not_null("id", AttrType::BigInt))
            .with_field(FieldMeta::new("name", AttrType::Text))
            .with_field(FieldMeta::new("dept", AttrType::Int))
            .with_index(IndexMeta::new("idx_dept", ["dept"]))
            .with_index(IndexMeta::new("idx_dept_id", ["dept", "id"])),
    );
    let depts = Arc::new(
        TableMeta::new("depts")
            .with_field(FieldMeta::not_null("id", AttrType::Int))
            .with_field(FieldMeta::new("title", AttrType::Text)),
    );

    let storage = Arc::new(MemoryStorage::new());
    storage.create_table(users.clone()).unwrap();
    storage.create_table(depts.clone()).unwrap();

    let txn = Transaction::new(1);
    let people = [
        (1, "ada", Some(10)),
        (2, "bob", Some(20)),
        (3, "cyd", Some(10)),
        (4, "dee", None),
        (5, "eve", Some(30)),
    ];
    for (id, name, dept) in people {
        let dept = dept.map_or(Value::Null, Value::int);
        storage
            .insert(&users, vec![Value::bigint(id), Value::string(name), dept], &txn)
            .unwrap();
    }
    for (id, title) in [(10, "eng"), (20, "ops"), (40, "law")] {
        storage
            .insert(&depts, vec![Value::int(id), Value::string(title)], &txn)
            .unwrap();
    }

    Fixture {
        storage,
        users,
        depts,
        txn,
    }
}

fn generator(f: &Fixture) -> PhysicalOperatorGenerator {
    PhysicalOperatorGenerator::new(f.storage.clone())
}

fn run(generator: &PhysicalOperatorGenerator, plan: LogicalNode, txn: &Transaction) -> Vec<Vec<Value>> {
    let mut root = generator.create(plan).unwrap();
    root.open(txn).unwrap();
    let mut rows = Vec::new();
    while root.next().unwrap() {
        let tuple = root.current_tuple().unwrap();
        rows.push((0..tuple.cell_num()).map(|i| tuple.cell_at(i).unwrap().clone()).collect());
    }
    root.close().unwrap();
    rows
}

fn users_get(f: &Fixture) -> TableGetNode {
    TableGetNode::new(f.users.clone())
}

#[test]
fn test_composite_index_point_lookup() {
    let f = fixture();
    let plan = LogicalNode::TableGet(
        users_get(&f)
            .with_predicate(Expression::eq(
                Expression::value(10),
                Expression::field("users", "dept"),
            ))
            .with_predicate(Expression::eq(
                Expression::field("users", "id"),
                Expression::value(Value::bigint(3)),
            )),
    );

    let root = generator(&f).create(plan.clone()).unwrap();
    assert_eq!(root.kind(), OperatorKind::IndexScan);
    assert_eq!(root.param(), "idx_dept_id ON users, [10, 3 .. 10, 3]");

    let rows = run(&generator(&f), plan, &f.txn);
    assert_eq!(
        rows,
        vec![vec![Value::bigint(3), Value::string("cyd"), Value::int(10)]]
    );
}

#[test]
fn test_index_lookup_applies_residual_predicates() {
    let f = fixture();
    let plan = LogicalNode::TableGet(users_get(&f).with_predicate(Expression::and(vec![
        Expression::eq(Expression::column("dept"), Expression::value(10)),
        Expression::comparison(CompOp::NotEq, Expression::column("name"), Expression::value("ada")),
    ])));

    let indexed = run(&generator(&f), plan.clone(), &f.txn);
    let scanned = run(
        &generator(&f).with_config(ExecutorConfig::builder().enable_index_scan(false).build()),
        plan,
        &f.txn,
    );
    assert_eq!(indexed.len(), 1);
    assert_eq!(indexed[0][1], Value::string("cyd"));
    assert_eq!(indexed, scanned);
}

#[test]
fn test_partial_key_falls_back_to_scan() {
    let f = fixture();
    let plan = LogicalNode::TableGet(users_get(&f).with_predicate(Expression::eq(
        Expression::column("id"),
        Expression::value(Value::bigint(2)),
    )));
    let root = generator(&f).create(plan.clone()).unwrap();
    assert_eq!(root.kind(), OperatorKind::TableScan);
    assert_eq!(run(&generator(&f), plan, &f.txn).len(), 1);
}

fn dept_join(f: &Fixture, condition: Expression) -> LogicalNode {
    LogicalNode::Join(JoinNode::new(
        LogicalNode::TableGet(users_get(f).with_alias("u")),
        LogicalNode::TableGet(TableGetNode::new(f.depts.clone()).with_alias("d")),
        Some(condition),
    ))
}

#[test]
fn test_hash_and_nested_loop_joins_agree() {
    let f = fixture();
    let condition = Expression::eq(Expression::field("d", "id"), Expression::field("u", "dept"));

    let root = generator(&f).create(dept_join(&f, condition.clone())).unwrap();
    assert_eq!(root.param(), "HASH, d.id = u.dept");

    let mut hashed = run(&generator(&f), dept_join(&f, condition.clone()), &f.txn);
    let mut looped = run(
        &generator(&f).with_config(ExecutorConfig::builder().enable_hash_join(false).build()),
        dept_join(&f, condition),
        &f.txn,
    );
    hashed.sort();
    looped.sort();
    assert_eq!(hashed, looped);

    // ada and cyd in eng, bob in ops; dee has no dept, eve's dept is missing.
    let names: Vec<&Value> = hashed.iter().map(|row| &row[1]).collect();
    assert_eq!(
        names,
        vec![&Value::string("ada"), &Value::string("bob"), &Value::string("cyd")]
    );
    assert!(hashed.iter().all(|row| row.len() == 5));
}

#[test]
fn test_inequality_join_uses_nested_loop() {
    let f = fixture();
    let condition = Expression::comparison(
        CompOp::Lt,
        Expression::field("u", "dept"),
        Expression::field("d", "id"),
    );
    let root = generator(&f).create(dept_join(&f, condition.clone())).unwrap();
    assert_eq!(root.param(), "NESTED_LOOP, u.dept < d.id");

    // dept 10 < {20, 40}, 20 < {40}, 30 < {40}; NULL compares with nothing.
    let rows = run(&generator(&f), dept_join(&f, condition), &f.txn);
    assert_eq!(rows.len(), 2 + 1 + 2 + 1);
}

#[test]
fn test_projection_order_by_over_filter() {
    let f = fixture();
    let plan = LogicalNode::Projection(ProjectionNode::new(
        vec![
            ProjectExpr::aliased(Expression::field("users", "name"), "who"),
            ProjectExpr::new(Expression::field("users", "dept")),
        ],
        LogicalNode::OrderBy(OrderByNode::new(
            vec![
                OrderUnit::desc(Expression::column("dept")),
                OrderUnit::asc(Expression::column("id")),
            ],
            LogicalNode::Predicate(PredicateNode::new(
                Expression::comparison(
                    CompOp::Lt,
                    Expression::column("id"),
                    Expression::value(Value::bigint(5)),
                ),
                LogicalNode::TableGet(users_get(&f)),
            )),
        )),
    ));

    let mut root = generator(&f).create(plan).unwrap();
    root.open(&f.txn).unwrap();
    let mut rows = Vec::new();
    while root.next().unwrap() {
        let tuple = root.current_tuple().unwrap();
        assert_eq!(tuple.spec_at(0).unwrap().to_string(), "who");
        assert_eq!(tuple.spec_at(1).unwrap().to_string(), "users.dept");
        rows.push(tuple.to_row().into_values());
    }
    root.close().unwrap();

    assert_eq!(
        rows,
        vec![
            vec![Value::string("bob"), Value::int(20)],
            vec![Value::string("ada"), Value::int(10)],
            vec![Value::string("cyd"), Value::int(10)],
            vec![Value::string("dee"), Value::Null],
        ]
    );
}

#[test]
fn test_aggregate_plan() {
    let f = fixture();
    let plan = LogicalNode::Aggregate(nexus_exec::logical::AggregateNode::new(
        vec![
            AggregateExpr::count_star(),
            AggregateExpr::new(AggregateFunc::Count, Expression::column("dept")),
            AggregateExpr::new(AggregateFunc::Sum, Expression::column("dept")),
            AggregateExpr::new(AggregateFunc::Max, Expression::column("name")).with_alias("last"),
        ],
        LogicalNode::TableGet(users_get(&f)),
    ));
    let rows = run(&generator(&f), plan, &f.txn);
    assert_eq!(
        rows,
        vec![vec![
            Value::bigint(5),
            Value::bigint(4),
            Value::bigint(70),
            Value::string("eve"),
        ]]
    );
}

#[test]
fn test_dml_round_trip() {
    let f = fixture();
    let gen = generator(&f);
    let txn = Transaction::new(7);

    let insert = LogicalNode::Insert(InsertNode::new(
        f.depts.clone(),
        vec![vec![Value::int(30), Value::string("sales")]],
    ));
    assert!(run(&gen, insert, &txn).is_empty());
    assert_eq!(f.storage.row_count("depts").unwrap(), 4);

    let update = LogicalNode::Update(UpdateNode::new(
        f.users.clone(),
        vec![UpdateAssignment::new("dept", Expression::value(40))],
        LogicalNode::TableGet(users_get(&f).with_predicate(Expression::eq(
            Expression::column("dept"),
            Expression::value(10),
        ))),
    ));
    f.storage.clear_lock_requests();
    run(&gen, update, &txn);
    assert!(f
        .storage
        .lock_requests()
        .iter()
        .all(|r| r.mode == LockMode::Exclusive && r.txn == txn.id()));

    let moved = LogicalNode::TableGet(users_get(&f).with_predicate(Expression::eq(
        Expression::column("dept"),
        Expression::value(40),
    )));
    assert_eq!(run(&gen, moved, &txn).len(), 2);

    let delete = LogicalNode::Delete(DeleteNode::new(
        f.users.clone(),
        LogicalNode::Predicate(PredicateNode::new(
            Expression::comparison(CompOp::GtEq, Expression::column("dept"), Expression::value(30)),
            LogicalNode::TableGet(users_get(&f)),
        )),
    ));
    run(&gen, delete, &txn);
    let remaining: Vec<Value> = f
        .storage
        .rows("users")
        .unwrap()
        .into_iter()
        .map(|row| row[1].clone())
        .collect();
    assert_eq!(remaining, vec![Value::string("bob"), Value::string("dee")]);
    assert_eq!(f.storage.open_cursors(), 0);
}

#[test]
fn test_explain_plan_text() {
    let f = fixture();
    let join = dept_join(
        &f,
        Expression::eq(Expression::field("u", "dept"), Expression::field("d", "id")),
    );
    let filtered = LogicalNode::Predicate(PredicateNode::new(
        Expression::eq(Expression::field("d", "title"), Expression::value("eng")),
        join,
    ));
    let plan = LogicalNode::Explain(ExplainNode::new(filtered));

    let gen = generator(&f).with_config(ExecutorConfig::builder().explain_header("plan").build());
    let root = gen.create(plan.clone()).unwrap();
    assert_eq!(
        explain_tree(&*root),
        "OPERATOR(NAME)\n\
         EXPLAIN\n\
         └─PREDICATE(d.title = 'eng')\n\
         \x20\x20└─JOIN(HASH, u.dept = d.id)\n\
         \x20\x20\x20\x20├─TABLE_SCAN(users AS u)\n\
         \x20\x20\x20\x20└─TABLE_SCAN(depts AS d)\n"
    );

    let mut root = gen.create(plan).unwrap();
    root.open(&f.txn).unwrap();
    assert!(root.next().unwrap());
    {
        let tuple = root.current_tuple().unwrap();
        assert_eq!(tuple.spec_at(0).unwrap().name(), "plan");
        let Value::String(text) = tuple.cell_at(0).unwrap() else {
            panic!("explain produced a non-text cell");
        };
        assert!(text.starts_with("OPERATOR(NAME)\nPREDICATE(d.title = 'eng')\n"));
    }
    assert!(!root.next().unwrap());
    root.close().unwrap();
}

#[test]
fn test_config_file_controls_planning() {
    let f = fixture();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exec.toml");
    std::fs::write(&path, "enable_hash_join = false\n").unwrap();

    let config = ExecutorConfig::from_file(&path).unwrap();
    assert!(config.enable_index_scan);
    assert_eq!(config.explain_header, "Query Plan");

    let gen = generator(&f).with_config(config);
    let condition = Expression::eq(Expression::field("u", "dept"), Expression::field("d", "id"));
    let root = gen.create(dept_join(&f, condition)).unwrap();
    assert_eq!(root.param(), "NESTED_LOOP, u.dept = d.id");
}
