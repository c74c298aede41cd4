use anyhow::Result;
use serde_json::json;

use medina_api::i18n::Lang;
use medina_api::query::{ApiFeatures, Bind, ListQuery, Pagination};

// These tests exercise the public query-augmentation surface: the chain of
// filter/search/sort/limit_fields/paginate over a deferred query, and the
// count-before-paginate contract.

fn list_query(pairs: &[(&str, &str)]) -> ListQuery {
    let mut q = ListQuery::default();
    for (k, v) in pairs {
        match *k {
            "page" => q.page = Some(v.to_string()),
            "limit" => q.limit = Some(v.to_string()),
            "sort" => q.sort = Some(v.to_string()),
            "fields" => q.fields = Some(v.to_string()),
            "keyword" => q.keyword = Some(v.to_string()),
            other => panic!("unknown param {}", other),
        }
    }
    q
}

#[test]
fn forty_five_documents_paginate_into_three_pages() -> Result<()> {
    // page 1: no previous, next = 2
    let p = Pagination::compute(1, 20, 45);
    assert_eq!(p.number_of_pages, 3);
    assert_eq!(p.previous_page, None);
    assert_eq!(p.next_page, Some(2));

    // page 3: previous = 2, no next
    let p = Pagination::compute(3, 20, 45);
    assert_eq!(p.previous_page, Some(2));
    assert_eq!(p.next_page, None);
    Ok(())
}

#[test]
fn pagination_serializes_camel_case_and_omits_absent_links() -> Result<()> {
    let v = serde_json::to_value(Pagination::compute(1, 20, 45))?;
    assert_eq!(v["currentPage"], 1);
    assert_eq!(v["numberOfPages"], 3);
    assert_eq!(v["nextPage"], 2);
    assert!(v.get("previousPage").is_none());
    Ok(())
}

#[test]
fn count_is_unaffected_by_page_and_limit() -> Result<()> {
    let build = |page: &str, limit: &str| {
        ApiFeatures::new(
            "products",
            &list_query(&[("page", page), ("limit", limit)]),
            Lang::En,
        )
        .filter(Some(&json!({ "status": "active" })))
    };

    let (a, _) = build("1", "10").clone_for_count().to_count_sql();
    let (b, _) = build("9", "50").clone_for_count().to_count_sql();
    assert_eq!(a, b, "count SQL must not depend on page bounds");
    assert!(a.contains("\"status\""));
    Ok(())
}

#[test]
fn full_chain_renders_filter_search_sort_projection_and_bounds() -> Result<()> {
    let query = list_query(&[
        ("page", "2"),
        ("limit", "10"),
        ("sort", "-title"),
        ("fields", "title image"),
        ("keyword", "honey"),
    ]);
    let af = ApiFeatures::new("products", &query, Lang::Ar)
        .filter(Some(&json!({ "price": { "lte": 100 } })))
        .search(&["titleEn", "titleAr"])
        .sort(&["title"], "-createdAt")
        .limit_fields(&["title"], "");

    let total = 45;
    let af = af.paginate(total);
    let (sql, binds) = af.to_sql();

    assert!(sql.contains("\"price\" <= $1"));
    assert!(sql.contains("ILIKE $2"));
    assert!(sql.contains("ILIKE $3"));
    assert!(sql.contains("ORDER BY main.\"titleAr\" DESC"));
    assert!(sql.contains("main.\"titleAr\""));
    assert!(sql.contains("LIMIT 10"));
    assert!(sql.contains("OFFSET 10"));
    assert_eq!(binds.len(), 3);
    assert!(matches!(&binds[1], Bind::Str(s) if s == "%honey%"));

    let p = af.pagination().expect("pagination set");
    assert_eq!(p.current_page, 2);
    assert_eq!(p.number_of_pages, 5);
    Ok(())
}

#[test]
fn absent_inputs_degrade_to_identity() -> Result<()> {
    let af = ApiFeatures::new("products", &ListQuery::default(), Lang::En)
        .filter(None)
        .search(&["titleEn"])
        .sort(&["title"], "")
        .limit_fields(&["title"], "");
    let (sql, binds) = af.to_sql();

    assert!(!sql.contains("WHERE"));
    assert!(!sql.contains("ORDER BY"));
    assert!(sql.contains("main.*"));
    assert!(binds.is_empty());
    Ok(())
}

#[test]
fn all_language_projects_both_variants() -> Result<()> {
    let query = list_query(&[("fields", "title"), ("sort", "title")]);
    let af = ApiFeatures::new("products", &query, Lang::All)
        .sort(&["title"], "")
        .limit_fields(&["title"], "");
    let (sql, _) = af.to_sql();

    assert!(sql.contains("main.\"titleEn\""));
    assert!(sql.contains("main.\"titleAr\""));
    assert!(sql.contains("\"titleEn\" ASC"));
    assert!(sql.contains("\"titleAr\" ASC"));
    Ok(())
}
