//! Envelope types shared by every collection

use serde::{Deserialize, Deserializer, Serialize};

/// Read an explicit `null` as the field's default value
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A collection response: counts, member links, actions and paging links
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListResource {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub subcount: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub pages: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub resources: Vec<ResourceRef>,
    #[serde(deserialize_with = "null_as_default")]
    pub actions: Vec<Action>,
    #[serde(deserialize_with = "null_as_default")]
    pub links: Links,
}

/// Reference to one member of a collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRef {
    #[serde(deserialize_with = "null_as_default")]
    pub href: String,
}

/// An action the server advertises for a resource or collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Links {
    #[serde(rename = "self", deserialize_with = "null_as_default")]
    pub self_link: String,
    #[serde(deserialize_with = "null_as_default")]
    pub first: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_resource_tolerates_missing_fields() {
        let list: ListResource = serde_json::from_value(json!({
            "name": "groups",
            "count": 2,
            "resources": [{"href": "https://host/api/groups/1"}],
            "links": {"self": "https://host/api/groups?offset=0", "first": "a", "last": "b"}
        }))
        .unwrap();

        assert_eq!(list.name, "groups");
        assert_eq!(list.count, 2);
        assert_eq!(list.subcount, 0);
        assert_eq!(list.resources[0].href, "https://host/api/groups/1");
        assert_eq!(list.links.self_link, "https://host/api/groups?offset=0");
        assert!(list.actions.is_empty());
    }

    #[test]
    fn test_list_resource_tolerates_nulls() {
        let list: ListResource = serde_json::from_value(json!({
            "name": "services",
            "count": null,
            "resources": null,
            "actions": [{"name": "edit", "method": null, "href": null}],
            "links": null
        }))
        .unwrap();

        assert_eq!(list.count, 0);
        assert!(list.resources.is_empty());
        assert_eq!(list.actions[0].method, "");
        assert_eq!(list.links, Links::default());
    }
}
