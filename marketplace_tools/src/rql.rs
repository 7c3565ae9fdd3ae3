//! Resource Query Language helpers for the marketplace list endpoints.

/// `in(field,(a,b,c))`
pub fn in_list<S: AsRef<str>>(field: &str, values: &[S]) -> String {
    let values = values.iter().map(|v| v.as_ref()).collect::<Vec<&str>>().join(",");
    format!("in({field},({values}))")
}

/// Query string selecting orders for the given products in any of the given statuses, oldest first.
pub fn orders_query<P: AsRef<str>, S: AsRef<str>>(
    product_ids: &[P],
    statuses: &[S],
    offset: usize,
    limit: usize,
) -> String {
    format!(
        "and({},{})&select=parameters,agreement&order=audit.created.at&limit={limit}&offset={offset}",
        in_list("product.id", product_ids),
        in_list("status", statuses)
    )
}
