//! Entity catalog: the resource descriptors mounted by the server.

use super::{Populate, Resource};

pub static BANNERS: Resource = Resource {
    table: "banners",
    label: "Banner",
    lang_fields: &["title"],
    select_str: "",
    default_sort: "-createdAt",
    searchable: &["titleEn", "titleAr"],
    populate: None,
    created_message: None,
    updated_message: None,
    deleted_message: None,
    return_data: true,
};

pub static CATEGORIES: Resource = Resource {
    table: "categories",
    label: "Category",
    lang_fields: &["name"],
    select_str: "",
    default_sort: "name",
    searchable: &["nameEn", "nameAr"],
    populate: None,
    created_message: None,
    updated_message: None,
    deleted_message: None,
    return_data: true,
};

pub static PRODUCTS: Resource = Resource {
    table: "products",
    label: "Product",
    lang_fields: &["title", "description"],
    select_str: "",
    default_sort: "-createdAt",
    searchable: &["titleEn", "titleAr", "descriptionEn", "descriptionAr"],
    populate: Some(Populate {
        field: "category",
        table: "categories",
        local_key: "categoryId",
        foreign_key: "id",
        select: "name icon",
        lang_fields: &["name"],
        many: false,
    }),
    created_message: None,
    updated_message: None,
    deleted_message: None,
    return_data: true,
};
