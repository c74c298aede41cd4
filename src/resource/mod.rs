//! Static per-entity configuration consumed by the generic resource
//! handlers, plus the localized-projection helpers applied to fetched
//! documents.

use serde_json::{Map, Value};

use crate::i18n::{self, Lang};

/// Join/population descriptor: embeds a related document (or list of documents)
/// under `field` by matching `table.foreign_key` against the parent's
/// `local_key` column.
#[derive(Debug, Clone)]
pub struct Populate {
    pub field: &'static str,
    pub table: &'static str,
    pub local_key: &'static str,
    pub foreign_key: &'static str,
    /// Space-separated base field names to project on the joined document;
    /// empty selects everything.
    pub select: &'static str,
    /// Localizable base names on the joined document.
    pub lang_fields: &'static [&'static str],
    pub many: bool,
}

impl Populate {
    /// Language-resolved column list for the joined document. The join key
    /// and id are always included so the embed is self-describing.
    pub fn columns(&self, lang: Lang) -> Vec<String> {
        if self.select.trim().is_empty() {
            return vec![];
        }
        let mut columns = vec!["id".to_string()];
        for token in self.select.replace(',', " ").split_whitespace() {
            for column in crate::query::resolve_columns(token, self.lang_fields, lang) {
                if !columns.contains(&column) {
                    columns.push(column);
                }
            }
        }
        columns
    }
}

/// Static descriptor for one entity type served by the generic handlers.
#[derive(Debug, Clone)]
pub struct Resource {
    /// Backing table.
    pub table: &'static str,
    /// Display name used in generated messages ("Banner not found").
    pub label: &'static str,
    /// Base names stored as `<base>En` / `<base>Ar` column pairs.
    pub lang_fields: &'static [&'static str],
    /// Default projection, space-separated base names; empty means all
    /// columns except the internal revision counter.
    pub select_str: &'static str,
    /// Default sort, space-separated base names with `-` for descending.
    pub default_sort: &'static str,
    /// Stored columns searched by the `keyword` parameter.
    pub searchable: &'static [&'static str],
    pub populate: Option<Populate>,
    /// Message template overrides; `None` falls back to the generated
    /// "<Label> ... successfully" form.
    pub created_message: Option<&'static str>,
    pub updated_message: Option<&'static str>,
    pub deleted_message: Option<&'static str>,
    /// When false, write operations omit the `data` payload.
    pub return_data: bool,
}

impl Resource {
    pub const fn new(table: &'static str, label: &'static str) -> Self {
        Resource {
            table,
            label,
            lang_fields: &[],
            select_str: "",
            default_sort: "",
            searchable: &[],
            populate: None,
            created_message: None,
            updated_message: None,
            deleted_message: None,
            return_data: true,
        }
    }

    pub fn not_found_message(&self, lang: Lang) -> String {
        i18n::translate(&format!("{} not found", self.label), lang)
    }

    pub fn created_message(&self, lang: Lang) -> String {
        let message = match self.created_message {
            Some(m) => m.to_string(),
            None => format!("{} created successfully", self.label),
        };
        i18n::translate(&message, lang)
    }

    pub fn updated_message(&self, lang: Lang) -> String {
        let message = match self.updated_message {
            Some(m) => m.to_string(),
            None => format!("{} updated successfully", self.label),
        };
        i18n::translate(&message, lang)
    }

    pub fn deleted_message(&self, lang: Lang) -> String {
        let message = match self.deleted_message {
            Some(m) => m.to_string(),
            None => format!("{} deleted successfully", self.label),
        };
        i18n::translate(&message, lang)
    }
}

/// Apply the localized projection to a fetched document in place: each
/// localizable base field receives the value of its language-suffixed
/// variant, with the suffixed variants left alongside. `all` leaves the
/// document as stored. Joined sub-documents localize through their own
/// field lists.
pub fn localize_document(doc: &mut Value, lang: Lang, resource: &Resource) {
    localize_fields(doc, lang, resource.lang_fields);
    if let Some(populate) = &resource.populate {
        if let Some(embedded) = doc.get_mut(populate.field) {
            match embedded {
                Value::Array(items) => {
                    for item in items {
                        localize_fields(item, lang, populate.lang_fields);
                    }
                }
                other => localize_fields(other, lang, populate.lang_fields),
            }
        }
    }
}

fn localize_fields(doc: &mut Value, lang: Lang, lang_fields: &[&str]) {
    let Some(suffix) = lang.suffix() else {
        return;
    };
    let Value::Object(map) = doc else {
        return;
    };
    for base in lang_fields {
        let variant = format!("{}{}", base, suffix);
        let value = map.get(&variant).cloned().unwrap_or(Value::Null);
        map.insert((*base).to_string(), value);
    }
}

/// Filter a response document down to exactly the top-level keys named by a
/// projection string. An empty projection returns the document unchanged.
pub fn apply_select_str(doc: Value, select_str: &str) -> Value {
    let fields: Vec<&str> = select_str.split_whitespace().collect();
    if fields.is_empty() {
        return doc;
    }
    match doc {
        Value::Object(map) => {
            let filtered: Map<String, Value> = map
                .into_iter()
                .filter(|(key, _)| fields.contains(&key.as_str()))
                .collect();
            Value::Object(filtered)
        }
        other => other,
    }
}

pub mod defs;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn banner() -> Resource {
        Resource {
            lang_fields: &["title"],
            ..Resource::new("banners", "Banner")
        }
    }

    #[test]
    fn localize_ar_populates_base_from_variant() {
        let mut doc = json!({ "titleEn": "Hello", "titleAr": "مرحبا", "image": "x.jpg" });
        localize_document(&mut doc, Lang::Ar, &banner());
        assert_eq!(doc["title"], "مرحبا");
        // stored variants stay alongside the projected base field
        assert_eq!(doc["titleEn"], "Hello");
        assert_eq!(doc["titleAr"], "مرحبا");
    }

    #[test]
    fn localize_all_leaves_document_as_stored() {
        let mut doc = json!({ "titleEn": "Hello", "titleAr": "مرحبا" });
        localize_document(&mut doc, Lang::All, &banner());
        assert!(doc.get("title").is_none());
    }

    #[test]
    fn localize_missing_variant_yields_null() {
        let mut doc = json!({ "titleEn": "Hello" });
        localize_document(&mut doc, Lang::Ar, &banner());
        assert_eq!(doc["title"], Value::Null);
    }

    #[test]
    fn localize_reaches_embedded_populate() {
        let resource = Resource {
            lang_fields: &["title"],
            populate: Some(Populate {
                field: "category",
                table: "categories",
                local_key: "categoryId",
                foreign_key: "id",
                select: "name",
                lang_fields: &["name"],
                many: false,
            }),
            ..Resource::new("products", "Product")
        };
        let mut doc = json!({
            "titleEn": "Jar",
            "titleAr": "برطمان",
            "category": { "nameEn": "Food", "nameAr": "طعام" }
        });
        localize_document(&mut doc, Lang::Ar, &resource);
        assert_eq!(doc["category"]["name"], "طعام");
    }

    #[test]
    fn populate_columns_expand_for_all() {
        let populate = Populate {
            field: "category",
            table: "categories",
            local_key: "categoryId",
            foreign_key: "id",
            select: "name icon",
            lang_fields: &["name"],
            many: false,
        };
        assert_eq!(
            populate.columns(Lang::All),
            vec!["id", "nameEn", "nameAr", "icon"]
        );
    }

    #[test]
    fn select_str_filters_top_level_keys() {
        let doc = json!({ "id": 1, "title": "x", "secret": "y" });
        let out = apply_select_str(doc, "id title");
        assert!(out.get("secret").is_none());
        assert_eq!(out["title"], "x");
    }

    #[test]
    fn empty_select_str_keeps_everything() {
        let doc = json!({ "id": 1, "secret": "y" });
        let out = apply_select_str(doc.clone(), "");
        assert_eq!(out, doc);
    }

    #[test]
    fn generated_messages_use_label() {
        let resource = banner();
        assert_eq!(resource.not_found_message(Lang::En), "Banner not found");
        assert_eq!(
            resource.created_message(Lang::En),
            "Banner created successfully"
        );
    }
}
