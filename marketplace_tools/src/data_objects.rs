use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ORGANIZATION_NAME: &str = "organizationName";
pub const CURRENCY: &str = "currency";
pub const ADMIN_CONTACT: &str = "adminContact";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub external_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl Parameter {
    /// The parameter value as text. Contact parameters are objects, in which case the email address is used.
    pub fn text(&self) -> Option<String> {
        let text = match self.value.as_ref()? {
            Value::Null => return None,
            Value::String(s) => s.trim().to_string(),
            Value::Object(obj) => obj.get("email").and_then(Value::as_str).unwrap_or_default().trim().to_string(),
            other => other.to_string(),
        };
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderParameters {
    #[serde(default)]
    pub ordering: Vec<Parameter>,
    #[serde(default)]
    pub fulfillment: Vec<Parameter>,
}

/// The subset of a marketplace order that the bridge consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceOrder {
    pub id: String,
    /// `Purchase`, `Change` or `Termination`. Empty if the marketplace did not send it.
    #[serde(rename = "type", default)]
    pub order_type: String,
    pub status: String,
    pub product: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agreement: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Reference>,
    #[serde(default)]
    pub parameters: OrderParameters,
}

impl MarketplaceOrder {
    pub fn ordering_parameter(&self, external_id: &str) -> Option<&Parameter> {
        self.parameters.ordering.iter().find(|p| p.external_id == external_id)
    }

    pub fn ordering_text(&self, external_id: &str) -> Option<String> {
        self.ordering_parameter(external_id).and_then(Parameter::text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusNotes {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub total: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(rename = "$meta", default)]
    pub meta: PageMeta,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Page<T> {
    /// The offset of the next page, if there is one.
    pub fn next_offset(&self) -> Option<usize> {
        let p = self.meta.pagination;
        let next = p.offset + self.data.len();
        (!self.data.is_empty() && next < p.total).then_some(next)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ORDER: &str = r#"{
        "id": "ORD-1",
        "type": "Purchase",
        "status": "Draft",
        "product": { "id": "PRD-1111-1111" },
        "agreement": { "id": "AGR-1" },
        "parameters": {
            "ordering": [
                { "externalId": "organizationName", "value": "Acme" },
                { "externalId": "currency", "value": " " },
                { "externalId": "adminContact", "value": { "firstName": "Jo", "email": "jo@acme.test" } }
            ]
        }
    }"#;

    #[test]
    fn ordering_parameters() {
        let order: MarketplaceOrder = serde_json::from_str(ORDER).unwrap();
        assert_eq!(order.product.id, "PRD-1111-1111");
        assert_eq!(order.order_type, "Purchase");
        assert_eq!(order.ordering_text(ORGANIZATION_NAME).as_deref(), Some("Acme"));
        assert_eq!(order.ordering_text(CURRENCY), None);
        assert_eq!(order.ordering_text(ADMIN_CONTACT).as_deref(), Some("jo@acme.test"));
        assert!(order.parameters.fulfillment.is_empty());
    }

    #[test]
    fn pagination() {
        let page: Page<MarketplaceOrder> = serde_json::from_str(&format!(
            r#"{{"$meta": {{"pagination": {{"offset": 0, "limit": 1, "total": 2}}}}, "data": [{ORDER}]}}"#
        ))
        .unwrap();
        assert_eq!(page.next_offset(), Some(1));
        let last: Page<MarketplaceOrder> = serde_json::from_str(&format!(
            r#"{{"$meta": {{"pagination": {{"offset": 1, "limit": 1, "total": 2}}}}, "data": [{ORDER}]}}"#
        ))
        .unwrap();
        assert_eq!(last.next_offset(), None);
    }
}
