//! Deferred query builder for the generic resource handlers.
//!
//! An [`ApiFeatures`] accumulates filter, keyword-search, sort, projection
//! and pagination state against one table and only renders SQL when asked.
//! Deferred rendering is what makes the count-then-paginate ordering work:
//! a clone taken before [`ApiFeatures::paginate`] shares the filter state
//! but produces a `COUNT(*)` untouched by page bounds.
//!
//! Rows come back as JSON documents via a `to_jsonb` wrapper, so the layer
//! above never needs per-column type mapping.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::config;
use crate::i18n::Lang;

/// Recognized list-endpoint query parameters. Anything else on the query
/// string is ignored here; structured filters arrive separately as a
/// request-scoped criteria object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub fields: Option<String>,
    pub keyword: Option<String>,
}

/// Pagination summary returned alongside list data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub limit: i64,
    pub number_of_pages: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_page: Option<i64>,
}

impl Pagination {
    pub fn compute(page: i64, limit: i64, total: i64) -> Self {
        let number_of_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Pagination {
            current_page: page,
            limit,
            number_of_pages,
            next_page: (page * limit < total).then_some(page + 1),
            previous_page: (page > 1).then_some(page - 1),
        }
    }
}

/// A bound query parameter. String values shaped like a UUID bind as uuid
/// so identifier filters hit uuid columns without an explicit cast.
#[derive(Debug, Clone)]
pub enum Bind {
    Str(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Uuid(Uuid),
    Json(Value),
    Null,
}

impl Bind {
    pub fn from_json(v: &Value) -> Bind {
        match v {
            Value::String(s) => match Uuid::parse_str(s) {
                Ok(u) => Bind::Uuid(u),
                Err(_) => Bind::Str(s.clone()),
            },
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Bind::I64(i)
                } else if let Some(f) = n.as_f64() {
                    Bind::F64(f)
                } else {
                    Bind::Null
                }
            }
            Value::Bool(b) => Bind::Bool(*b),
            Value::Null => Bind::Null,
            other => Bind::Json(other.clone()),
        }
    }
}

pub fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    binds: &[Bind],
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    for b in binds {
        query = match b {
            Bind::Str(s) => query.bind(s.clone()),
            Bind::I64(n) => query.bind(*n),
            Bind::F64(f) => query.bind(*f),
            Bind::Bool(b) => query.bind(*b),
            Bind::Uuid(u) => query.bind(*u),
            Bind::Json(v) => query.bind(v.clone()),
            Bind::Null => query.bind(Option::<String>::None),
        };
    }
    query
}

/// Valid SQL identifier per our naming rules (quoted camelCase columns).
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn quoted(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Comparison operators accepted inside a structured filter value.
const FILTER_OPS: &[(&str, &str)] = &[
    ("gte", ">="),
    ("gt", ">"),
    ("lte", "<="),
    ("lt", "<"),
    ("ne", "<>"),
];

const MAIN_ALIAS: &str = "main";

/// Internal column carrying the document revision counter; excluded from
/// every response.
const REVISION_COLUMN: &str = "revision";

#[derive(Debug, Clone)]
pub struct ApiFeatures {
    table: String,
    lang: Lang,
    select: Vec<String>,
    extra_select: Vec<String>,
    wheres: Vec<String>,
    binds: Vec<Bind>,
    order: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    page_param: Option<String>,
    limit_param: Option<String>,
    sort_param: Option<String>,
    fields_param: Option<String>,
    keyword: Option<String>,
    pagination: Option<Pagination>,
}

impl ApiFeatures {
    pub fn new(table: &str, query: &ListQuery, lang: Lang) -> Self {
        ApiFeatures {
            table: table.to_string(),
            lang,
            select: vec![],
            extra_select: vec![],
            wheres: vec![],
            binds: vec![],
            order: vec![],
            limit: None,
            offset: None,
            page_param: query.page.clone(),
            limit_param: query.limit.clone(),
            sort_param: query.sort.clone(),
            fields_param: query.fields.clone(),
            keyword: query.keyword.clone(),
            pagination: None,
        }
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    fn push_bind(&mut self, bind: Bind) -> usize {
        self.binds.push(bind);
        self.binds.len()
    }

    /// Restrict the query to a single document by primary key.
    pub fn by_id(mut self, id: Uuid) -> Self {
        let n = self.push_bind(Bind::Uuid(id));
        self.wheres.push(format!("{}.{} = ${}", MAIN_ALIAS, quoted("id"), n));
        self
    }

    /// Apply an upstream-supplied structured filter object. Each entry is a
    /// column mapped either to a plain value (equality) or to an object of
    /// comparison operators. Absent criteria keeps the query unfiltered;
    /// unknown shapes and invalid column names are skipped.
    pub fn filter(mut self, criteria: Option<&Value>) -> Self {
        let Some(Value::Object(map)) = criteria else {
            return self;
        };
        for (column, value) in map {
            if !is_identifier(column) {
                continue;
            }
            match value {
                Value::Object(ops) => {
                    for (op, operand) in ops {
                        let Some((_, sql_op)) = FILTER_OPS.iter().find(|(name, _)| name == op)
                        else {
                            continue;
                        };
                        let n = self.push_bind(Bind::from_json(operand));
                        self.wheres
                            .push(format!("{}.{} {} ${}", MAIN_ALIAS, quoted(column), sql_op, n));
                    }
                }
                other => {
                    let n = self.push_bind(Bind::from_json(other));
                    self.wheres
                        .push(format!("{}.{} = ${}", MAIN_ALIAS, quoted(column), n));
                }
            }
        }
        self
    }

    /// Add one disjunctive pattern-match group over the entity's searchable
    /// text columns when a `keyword` parameter is present.
    pub fn search(mut self, searchable: &[&str]) -> Self {
        let Some(keyword) = self.keyword.clone().filter(|k| !k.trim().is_empty()) else {
            return self;
        };
        let columns: Vec<&&str> = searchable.iter().filter(|c| is_identifier(c)).collect();
        if columns.is_empty() {
            return self;
        }
        let pattern = format!("%{}%", keyword.trim());
        let mut parts = Vec::with_capacity(columns.len());
        for column in columns {
            let n = self.push_bind(Bind::Str(pattern.clone()));
            parts.push(format!("{}.{} ILIKE ${}", MAIN_ALIAS, quoted(column), n));
        }
        self.wheres.push(format!("({})", parts.join(" OR ")));
        self
    }

    /// Apply ordering. The request `sort` parameter wins over the resource
    /// default; tokens are space-separated base field names, `-` prefix for
    /// descending. Localizable base names resolve to their suffixed stored
    /// columns (both variants when the language is `all`).
    pub fn sort(mut self, lang_fields: &[&str], default_sort: &str) -> Self {
        let raw = self
            .sort_param
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default_sort.to_string());
        if raw.trim().is_empty() {
            return self;
        }
        for token in raw.replace(',', " ").split_whitespace() {
            let (base, direction) = match token.strip_prefix('-') {
                Some(rest) => (rest, "DESC"),
                None => (token, "ASC"),
            };
            if !is_identifier(base) {
                continue;
            }
            for column in resolve_columns(base, lang_fields, self.lang) {
                self.order.push(format!("{}.{} {}", MAIN_ALIAS, quoted(&column), direction));
            }
        }
        self
    }

    /// Apply field projection. The request `fields` parameter wins over the
    /// resource default; localizable base names resolve the same way as in
    /// [`ApiFeatures::sort`]. With no projection at all, every column except
    /// the internal revision counter is returned.
    pub fn limit_fields(mut self, lang_fields: &[&str], default_fields: &str) -> Self {
        let raw = self
            .fields_param
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default_fields.to_string());
        if raw.trim().is_empty() {
            return self;
        }
        let mut columns = vec!["id".to_string()];
        for token in raw.replace(',', " ").split_whitespace() {
            // Exclusion tokens belong to the stored-query dialect we replaced;
            // the revision column is always excluded anyway.
            if token.starts_with('-') {
                continue;
            }
            if !is_identifier(token) {
                continue;
            }
            for column in resolve_columns(token, lang_fields, self.lang) {
                if !columns.contains(&column) {
                    columns.push(column);
                }
            }
        }
        self.select = columns;
        self
    }

    /// Attach a joined sub-document as a correlated JSON subquery. `columns`
    /// must already be language-resolved by the caller.
    pub fn populate(
        mut self,
        field: &str,
        table: &str,
        local_key: &str,
        foreign_key: &str,
        columns: &[String],
        many: bool,
    ) -> Self {
        if !(is_identifier(field)
            && is_identifier(table)
            && is_identifier(local_key)
            && is_identifier(foreign_key))
        {
            return self;
        }
        let projection = if columns.is_empty() {
            "*".to_string()
        } else {
            columns
                .iter()
                .filter(|c| is_identifier(c))
                .map(|c| quoted(c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let inner = format!(
            "SELECT {} FROM {} WHERE {} = {}.{}",
            projection,
            quoted(table),
            quoted(foreign_key),
            MAIN_ALIAS,
            quoted(local_key)
        );
        let subquery = if many {
            format!(
                "(SELECT COALESCE(json_agg(row_to_json(sub)), '[]'::json) FROM ({}) sub)",
                inner
            )
        } else {
            format!("(SELECT row_to_json(sub) FROM ({}) sub)", inner)
        };
        self.extra_select.push(format!("{} AS {}", subquery, quoted(field)));
        self
    }

    /// Apply pagination bounds from the request parameters and derive the
    /// pagination summary for the given pre-pagination total.
    pub fn paginate(mut self, total: i64) -> Self {
        let defaults = &config::config().pagination;
        let page = self
            .page_param
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let limit = self
            .limit_param
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(defaults.default_limit)
            .min(defaults.max_limit);
        self.limit = Some(limit);
        self.offset = Some((page - 1) * limit);
        self.pagination = Some(Pagination::compute(page, limit, total));
        self
    }

    /// Independent augmenter over the same filter state. Taken before
    /// [`ApiFeatures::paginate`] so the total reflects filters but not page
    /// bounds.
    pub fn clone_for_count(&self) -> Self {
        self.clone()
    }

    fn where_clause(&self) -> String {
        if self.wheres.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.wheres.join(" AND "))
        }
    }

    /// Render the data query. Rows carry one `row` column holding the JSON
    /// document with the revision counter removed.
    pub fn to_sql(&self) -> (String, Vec<Bind>) {
        let mut select_parts: Vec<String> = if self.select.is_empty() {
            vec![format!("{}.*", MAIN_ALIAS)]
        } else {
            self.select
                .iter()
                .map(|c| format!("{}.{}", MAIN_ALIAS, quoted(c)))
                .collect()
        };
        select_parts.extend(self.extra_select.iter().cloned());

        let order_clause = if self.order.is_empty() {
            String::new()
        } else {
            format!(" ORDER BY {}", self.order.join(", "))
        };
        let limit_clause = self.limit.map(|l| format!(" LIMIT {}", l)).unwrap_or_default();
        let offset_clause = self.offset.map(|o| format!(" OFFSET {}", o)).unwrap_or_default();

        let inner = format!(
            "SELECT {} FROM {} {}{}{}{}{}",
            select_parts.join(", "),
            quoted(&self.table),
            MAIN_ALIAS,
            self.where_clause(),
            order_clause,
            limit_clause,
            offset_clause
        );
        let sql = format!(
            "SELECT to_jsonb(t) - '{}' AS row FROM ({}) t",
            REVISION_COLUMN, inner
        );
        (sql, self.binds.clone())
    }

    /// Render the count query: same filters, no projection, no page bounds.
    pub fn to_count_sql(&self) -> (String, Vec<Bind>) {
        let sql = format!(
            "SELECT COUNT(*) AS count FROM {} {}{}",
            quoted(&self.table),
            MAIN_ALIAS,
            self.where_clause()
        );
        (sql, self.binds.clone())
    }

    /// Execute the data query.
    pub async fn fetch(&self, pool: &PgPool) -> Result<Vec<Value>, sqlx::Error> {
        let (sql, binds) = self.to_sql();
        tracing::debug!(sql = %sql, "query");
        let rows = bind_all(sqlx::query(&sql), &binds).fetch_all(pool).await?;
        rows.iter().map(|r| r.try_get::<Value, _>("row")).collect()
    }

    /// Execute the count query.
    pub async fn count(&self, pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (sql, binds) = self.to_count_sql();
        tracing::debug!(sql = %sql, "count query");
        let row = bind_all(sqlx::query(&sql), &binds).fetch_one(pool).await?;
        row.try_get("count")
    }
}

/// Resolve a requested base field to the stored columns it names: localizable
/// fields expand to their language-suffixed variants, everything else passes
/// through unchanged.
pub fn resolve_columns(base: &str, lang_fields: &[&str], lang: Lang) -> Vec<String> {
    if lang_fields.contains(&base) {
        lang.suffixes()
            .iter()
            .map(|suffix| format!("{}{}", base, suffix))
            .collect()
    } else {
        vec![base.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        let mut q = ListQuery::default();
        for (k, v) in pairs {
            match *k {
                "page" => q.page = Some(v.to_string()),
                "limit" => q.limit = Some(v.to_string()),
                "sort" => q.sort = Some(v.to_string()),
                "fields" => q.fields = Some(v.to_string()),
                "keyword" => q.keyword = Some(v.to_string()),
                _ => unreachable!(),
            }
        }
        q
    }

    #[test]
    fn pagination_middle_page() {
        let p = Pagination::compute(2, 20, 45);
        assert_eq!(p.number_of_pages, 3);
        assert_eq!(p.next_page, Some(3));
        assert_eq!(p.previous_page, Some(1));
    }

    #[test]
    fn pagination_first_page_has_no_previous() {
        let p = Pagination::compute(1, 20, 45);
        assert_eq!(p.number_of_pages, 3);
        assert_eq!(p.next_page, Some(2));
        assert_eq!(p.previous_page, None);
    }

    #[test]
    fn pagination_last_page_has_no_next() {
        let p = Pagination::compute(3, 20, 45);
        assert_eq!(p.previous_page, Some(2));
        assert_eq!(p.next_page, None);
    }

    #[test]
    fn pagination_exact_boundary() {
        let p = Pagination::compute(2, 20, 40);
        assert_eq!(p.number_of_pages, 2);
        assert_eq!(p.next_page, None);
    }

    #[test]
    fn pagination_empty_result() {
        let p = Pagination::compute(1, 20, 0);
        assert_eq!(p.number_of_pages, 0);
        assert_eq!(p.next_page, None);
        assert_eq!(p.previous_page, None);
    }

    #[test]
    fn filter_absent_is_identity() {
        let af = ApiFeatures::new("banners", &ListQuery::default(), Lang::En).filter(None);
        let (sql, binds) = af.to_sql();
        assert!(!sql.contains("WHERE"));
        assert!(binds.is_empty());
    }

    #[test]
    fn filter_equality_and_operators() {
        let criteria = json!({ "status": "active", "price": { "gte": 10, "lt": 50 } });
        let af =
            ApiFeatures::new("products", &ListQuery::default(), Lang::En).filter(Some(&criteria));
        let (sql, binds) = af.to_sql();
        assert!(sql.contains("\"status\" = $"));
        assert!(sql.contains("\"price\" >= $"));
        assert!(sql.contains("\"price\" < $"));
        assert_eq!(binds.len(), 3);
    }

    #[test]
    fn filter_skips_invalid_column_names() {
        let criteria = json!({ "name\"; DROP TABLE x; --": "boom" });
        let af =
            ApiFeatures::new("products", &ListQuery::default(), Lang::En).filter(Some(&criteria));
        let (sql, binds) = af.to_sql();
        assert!(!sql.contains("DROP TABLE"));
        assert!(binds.is_empty());
    }

    #[test]
    fn filter_binds_uuid_shaped_strings_as_uuid() {
        let criteria = json!({ "category": "a9c71672-6c2e-4b12-9b4e-0d6a7e2c8f10" });
        let af =
            ApiFeatures::new("products", &ListQuery::default(), Lang::En).filter(Some(&criteria));
        let (_, binds) = af.to_sql();
        assert!(matches!(binds[0], Bind::Uuid(_)));
    }

    #[test]
    fn search_without_keyword_is_identity() {
        let af = ApiFeatures::new("banners", &ListQuery::default(), Lang::En)
            .search(&["titleEn", "titleAr"]);
        let (sql, _) = af.to_sql();
        assert!(!sql.contains("ILIKE"));
    }

    #[test]
    fn search_builds_disjunction_over_searchable_columns() {
        let q = query(&[("keyword", "honey")]);
        let af = ApiFeatures::new("products", &q, Lang::En).search(&["titleEn", "titleAr"]);
        let (sql, binds) = af.to_sql();
        assert!(sql.contains("\"titleEn\" ILIKE $1 OR main.\"titleAr\" ILIKE $2"));
        assert_eq!(binds.len(), 2);
        assert!(matches!(&binds[0], Bind::Str(s) if s == "%honey%"));
    }

    #[test]
    fn sort_resolves_localized_fields() {
        let q = query(&[("sort", "-title createdAt")]);
        let af = ApiFeatures::new("products", &q, Lang::Ar).sort(&["title"], "");
        let (sql, _) = af.to_sql();
        assert!(sql.contains("ORDER BY main.\"titleAr\" DESC, main.\"createdAt\" ASC"));
    }

    #[test]
    fn sort_expands_both_variants_for_all() {
        let q = query(&[("sort", "title")]);
        let af = ApiFeatures::new("products", &q, Lang::All).sort(&["title"], "");
        let (sql, _) = af.to_sql();
        assert!(sql.contains("\"titleEn\" ASC"));
        assert!(sql.contains("\"titleAr\" ASC"));
    }

    #[test]
    fn sort_falls_back_to_default() {
        let af = ApiFeatures::new("products", &ListQuery::default(), Lang::En)
            .sort(&[], "-createdAt");
        let (sql, _) = af.to_sql();
        assert!(sql.contains("ORDER BY main.\"createdAt\" DESC"));
    }

    #[test]
    fn limit_fields_projects_resolved_columns() {
        let q = query(&[("fields", "title image")]);
        let af = ApiFeatures::new("products", &q, Lang::En).limit_fields(&["title"], "");
        let (sql, _) = af.to_sql();
        assert!(sql.contains("main.\"id\", main.\"titleEn\", main.\"image\""));
    }

    #[test]
    fn limit_fields_absent_excludes_revision_only() {
        let af = ApiFeatures::new("products", &ListQuery::default(), Lang::En)
            .limit_fields(&["title"], "");
        let (sql, _) = af.to_sql();
        assert!(sql.contains("main.*"));
        assert!(sql.contains("- 'revision'"));
    }

    #[test]
    fn count_sql_reflects_filters_but_not_pagination() {
        let q = query(&[("page", "3"), ("limit", "5"), ("keyword", "x")]);
        let af = ApiFeatures::new("products", &q, Lang::En)
            .filter(Some(&json!({ "status": "active" })))
            .search(&["titleEn"]);
        let counter = af.clone_for_count();
        let af = af.paginate(45);
        let (count_sql, count_binds) = counter.to_count_sql();
        let (data_sql, _) = af.to_sql();

        assert!(count_sql.contains("COUNT(*)"));
        assert!(count_sql.contains("\"status\" = $1"));
        assert!(count_sql.contains("ILIKE $2"));
        assert!(!count_sql.contains("LIMIT"));
        assert!(!count_sql.contains("OFFSET"));
        assert_eq!(count_binds.len(), 2);
        assert!(data_sql.contains("LIMIT 5"));
        assert!(data_sql.contains("OFFSET 10"));
    }

    #[test]
    fn paginate_defaults_page_and_limit() {
        let af = ApiFeatures::new("products", &ListQuery::default(), Lang::En).paginate(45);
        let p = af.pagination().unwrap();
        assert_eq!(p.current_page, 1);
        assert_eq!(p.limit, 20);
        assert_eq!(p.number_of_pages, 3);
    }

    #[test]
    fn populate_renders_correlated_subquery() {
        let af = ApiFeatures::new("products", &ListQuery::default(), Lang::En).populate(
            "category",
            "categories",
            "categoryId",
            "id",
            &["id".to_string(), "nameEn".to_string()],
            false,
        );
        let (sql, _) = af.to_sql();
        assert!(sql.contains("row_to_json(sub)"));
        assert!(sql.contains("\"categories\""));
        assert!(sql.contains("\"id\" = main.\"categoryId\""));
        assert!(sql.contains("AS \"category\""));
    }

    #[test]
    fn by_id_binds_uuid() {
        let id = Uuid::new_v4();
        let af = ApiFeatures::new("products", &ListQuery::default(), Lang::En).by_id(id);
        let (sql, binds) = af.to_sql();
        assert!(sql.contains("\"id\" = $1"));
        assert!(matches!(binds[0], Bind::Uuid(u) if u == id));
    }

    #[test]
    fn resolve_columns_passthrough_for_plain_fields() {
        assert_eq!(resolve_columns("image", &["title"], Lang::Ar), vec!["image"]);
        assert_eq!(
            resolve_columns("title", &["title"], Lang::All),
            vec!["titleEn", "titleAr"]
        );
    }
}
