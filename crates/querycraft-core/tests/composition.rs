//! Integration tests for queries composed from other queries: joins,
//! grouping, aggregates, subqueries and set operations.

mod common;
use common::*;

use querycraft_core::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Joins
// =============================================================================

#[test]
fn inner_join_on_keys() {
    let query = customers().join(
        orders(),
        |c| c.id.clone(),
        |o| o.customer_id.clone(),
        |c, o| (c.name.clone(), o.total.clone()),
    );

    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT customers.Name, orders.Total FROM customers \
         INNER JOIN orders ON customers.Id = orders.CustomerId"
    );
}

#[test]
fn left_join_makes_right_columns_nullable() {
    let query = customers().left_join(
        orders(),
        |c| c.id.clone(),
        |o| o.customer_id.clone(),
        |c, o| (c.name.clone(), o.total.clone()),
    );

    assert_eq!(
        sql(&query, DialectKind::Sqlite).sql,
        "SELECT customers.Name, orders.Total FROM customers \
         LEFT JOIN orders ON customers.Id = orders.CustomerId"
    );
    let columns = query.columns();
    assert!(!columns[0].nullable);
    assert!(columns[1].nullable);
}

#[test]
fn filtered_right_side_moves_into_on() {
    let query = customers()
        .join(
            orders().filter(|o| o.total.gt(100)),
            |c| c.id.clone(),
            |o| o.customer_id.clone(),
            |c, o| (c.name.clone(), o.total.clone()),
        )
        .filter(|r| r.0.not_eq("Admin"));

    let compiled = sql(&query, DialectKind::SqlServer);
    assert_eq!(
        compiled.sql,
        "SELECT customers.Name, orders.Total FROM customers \
         INNER JOIN orders ON (customers.Id = orders.CustomerId) AND (orders.Total > @p0) \
         WHERE customers.Name != @p1"
    );
    assert_eq!(
        params(&compiled),
        vec![param("@p0", Decimal::from(100)), param("@p1", "Admin")]
    );
}

#[test]
fn projected_right_side_joins_as_derived_table() {
    let totals = orders().select(|o| (o.customer_id.clone(), o.total.clone()));
    let query = customers().join(
        totals,
        |c| c.id.clone(),
        |t| t.0.clone(),
        |c, t| (c.name.clone(), t.1.clone()),
    );

    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT customers.Name, t0.c1 FROM customers \
         INNER JOIN (SELECT orders.CustomerId AS c0, orders.Total AS c1 FROM orders) AS t0 \
         ON customers.Id = t0.c0"
    );
}

#[test]
fn self_join_with_aliases() {
    let table = Customer::table();
    let query = Query::from_as(&table, "a").join_on(
        Query::from_as(&table, "b"),
        |a, b| a.age.eq(&b.age) & a.id.lt(&b.id),
        |a, b| (a.name.clone(), b.name.clone()),
    );

    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT a.Name, b.Name FROM customers AS a \
         INNER JOIN customers AS b ON (a.Age = b.Age) AND (a.Id < b.Id)"
    );
}

#[test]
fn joining_a_query_with_itself_keeps_aliases_apart() {
    let names = customers()
        .select(|c| (c.id.clone(), c.name.clone()))
        .distinct();
    let query = names.clone().join(
        names,
        |l| l.0.clone(),
        |r| r.0.clone(),
        |l, r| (l.1.clone(), r.1.clone()),
    );

    let compiled = sql(&query, DialectKind::Postgres);
    assert!(compiled.sql.starts_with("SELECT t0.c1, t1.c1 FROM (SELECT DISTINCT"));
    assert!(compiled.sql.ends_with(") AS t1 ON t0.c0 = t1.c0"));
}

#[test]
fn unaliased_self_join_derives_right_side() {
    let query = customers().join(
        customers(),
        |l| l.age.clone(),
        |r| r.age.clone(),
        |l, r| (l.name.clone(), r.name.clone()),
    );

    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT customers.Name, t0.c2 FROM customers \
         INNER JOIN (SELECT customers.Id AS c0, customers.Age AS c1, customers.Name AS c2, \
         customers.Email AS c3 FROM customers) AS t0 ON customers.Age = t0.c1"
    );
}

// =============================================================================
// Grouping
// =============================================================================

#[test]
fn group_with_aggregates() {
    let query = orders()
        .group_by(|o| o.customer_id.clone())
        .select(|g| (g.key().clone(), g.count(), g.sum(|o| o.total.clone())));

    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT orders.CustomerId, COUNT(*), SUM(orders.Total) FROM orders \
         GROUP BY orders.CustomerId"
    );
}

#[test]
fn having_and_filter_after_group() {
    let query = orders()
        .filter(|o| o.total.gt(0))
        .group_by(|o| o.customer_id.clone())
        .having(|g| g.count().gt(1))
        .select(|g| (g.key().clone(), g.max(|o| o.total.clone())))
        .filter(|r| r.1.lt(1000));

    let compiled = sql(&query, DialectKind::SqlServer);
    assert_eq!(
        compiled.sql,
        "SELECT orders.CustomerId, MAX(orders.Total) FROM orders \
         WHERE orders.Total > @p0 GROUP BY orders.CustomerId \
         HAVING (COUNT(*) > @p1) AND (MAX(orders.Total) < @p2)"
    );
    assert_eq!(compiled.parameters.len(), 3);
}

#[test]
fn average_of_integers_is_decimal() {
    let query = customers()
        .group_by(|c| c.name.clone())
        .select(|g| (g.key().clone(), g.avg(|c| c.age.clone())));

    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT customers.Name, AVG(CAST(customers.Age AS NUMERIC)) FROM customers \
         GROUP BY customers.Name"
    );
}

#[test]
fn count_distinct() {
    let query = orders()
        .group_by(|o| o.customer_id.clone())
        .select(|g| g.count_distinct(|o| o.placed_at.clone()));

    assert_eq!(
        sql(&query, DialectKind::Sqlite).sql,
        "SELECT COUNT(DISTINCT orders.PlacedAt) FROM orders GROUP BY orders.CustomerId"
    );
}

// =============================================================================
// Aggregates over whole queries
// =============================================================================

#[test]
fn count_as_statement() {
    let count = customers().filter(|c| c.age.gt_eq(18)).count();
    let compiled = sql(&count, DialectKind::SqlServer);
    assert_eq!(
        compiled.sql,
        "SELECT COUNT(*) FROM customers WHERE customers.Age >= @p0"
    );
}

#[test]
fn sum_of_projected_column() {
    let total = orders()
        .filter(|o| o.customer_id.eq(3))
        .select(|o| o.total.clone())
        .sum();

    assert_eq!(
        sql(&total, DialectKind::Postgres).sql,
        "SELECT SUM(orders.Total) FROM orders WHERE orders.CustomerId = :p0"
    );
}

#[test]
fn aggregate_drops_ordering() {
    let oldest = customers().order_by(|c| c.name.clone()).max_by(|c| c.age.clone());
    assert_eq!(
        sql(&oldest, DialectKind::Sqlite).sql,
        "SELECT MAX(customers.Age) FROM customers"
    );
}

#[test]
fn correlated_count_in_projection() {
    let query = customers().select(|c| {
        (
            c.name.clone(),
            orders().filter(|o| o.customer_id.eq(&c.id)).count(),
        )
    });

    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT customers.Name, (SELECT COUNT(*) FROM orders \
         WHERE orders.CustomerId = customers.Id) FROM customers"
    );
}

// =============================================================================
// Subqueries
// =============================================================================

#[test]
fn exists_subquery() {
    let query = customers()
        .filter(|c| orders().filter(|o| o.customer_id.eq(&c.id)).any())
        .select(|c| c.name.clone());

    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT customers.Name FROM customers WHERE EXISTS (SELECT orders.Id, \
         orders.CustomerId, orders.Total, orders.PlacedAt FROM orders \
         WHERE orders.CustomerId = customers.Id)"
    );
}

#[test]
fn in_subquery() {
    let buyers = orders().select(|o| o.customer_id.clone());
    let query = customers()
        .filter(|c| c.id.in_query(&buyers))
        .select(|c| c.name.clone());

    assert_eq!(
        sql(&query, DialectKind::Sqlite).sql,
        "SELECT customers.Name FROM customers \
         WHERE (customers.Id IN (SELECT orders.CustomerId FROM orders))"
    );
}

#[test]
fn nested_subquery_drops_unbounded_ordering() {
    let buyers = orders()
        .order_by(|o| o.placed_at.clone())
        .select(|o| o.customer_id.clone());
    let query = customers()
        .filter(|c| c.id.not_in_query(&buyers))
        .select(|c| c.id.clone());

    assert_eq!(
        sql(&query, DialectKind::Postgres).sql,
        "SELECT customers.Id FROM customers \
         WHERE (customers.Id NOT IN (SELECT orders.CustomerId FROM orders))"
    );
}

// =============================================================================
// Set operations
// =============================================================================

fn names_younger_than(age: i64) -> Query<Expr<String>> {
    customers()
        .filter(move |c| c.age.lt(age))
        .select(|c| c.name.clone())
}

#[test]
fn union_of_two_queries() {
    let query = names_younger_than(18).union(
        customers()
            .filter(|c| c.age.gt(65))
            .select(|c| c.name.clone()),
    );

    let compiled = sql(&query, DialectKind::Postgres);
    assert_eq!(
        compiled.sql,
        "SELECT customers.Name FROM customers WHERE customers.Age < :p0 \
         UNION SELECT customers.Name FROM customers WHERE customers.Age > :p1"
    );
    assert_eq!(params(&compiled), vec![param(":p0", 18), param(":p1", 65)]);
}

#[test]
fn chained_union_all_stays_flat() {
    let query = names_younger_than(10)
        .union_all(names_younger_than(20))
        .union_all(names_younger_than(30));

    let compiled = sql(&query, DialectKind::Sqlite);
    assert_eq!(compiled.sql.matches(" UNION ALL ").count(), 2);
    assert!(!compiled.sql.contains("AS t0"));
}

#[test]
fn mixed_set_operators_wrap() {
    let query = names_younger_than(10)
        .union(names_younger_than(20))
        .except(names_younger_than(5));

    let compiled = sql(&query, DialectKind::Postgres);
    assert!(compiled.sql.starts_with(
        "SELECT t0.c0 FROM (SELECT customers.Name AS c0 FROM customers WHERE customers.Age < :p0 \
         UNION SELECT customers.Name AS c0 FROM customers WHERE customers.Age < :p1) AS t0 EXCEPT "
    ));
}

#[test]
fn ordering_a_union_wraps_it() {
    let query = names_younger_than(18)
        .union(names_younger_than(30))
        .order_by(|n| n.clone());

    let compiled = sql(&query, DialectKind::Postgres);
    assert!(compiled.sql.starts_with("SELECT t0.c0 FROM (SELECT customers.Name AS c0"));
    assert!(compiled.sql.ends_with(") AS t0 ORDER BY t0.c0 ASC"));
}

#[test]
fn set_operation_shape_mismatch() {
    let left = customers().select(|c| vec![c.id.erase()]);
    let right = customers().select(|c| vec![c.id.erase(), c.name.erase()]);

    let err = compile_err(&left.union(right), DialectKind::Postgres);
    assert!(matches!(
        err,
        CompileError::ShapeMismatch {
            context: "UNION",
            ..
        }
    ));
}
