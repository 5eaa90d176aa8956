//! Support contacts shown alongside assessment results

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportContact {
    pub name: &'static str,
    pub number: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceGroup {
    pub key: &'static str,
    pub title: &'static str,
    pub contacts: &'static [SupportContact],
}

pub const SAFETY_RESOURCES: [ResourceGroup; 3] = [
    ResourceGroup {
        key: "emergency",
        title: "Emergency Services",
        contacts: &[
            SupportContact { name: "Emergency", number: "000" },
            SupportContact { name: "Police", number: "131 444" },
        ],
    },
    ResourceGroup {
        key: "hotlines",
        title: "24/7 Support Hotlines",
        contacts: &[
            SupportContact { name: "1800RESPECT", number: "1800 737 732" },
            SupportContact { name: "Lifeline", number: "13 11 14" },
            SupportContact { name: "DV Connect", number: "1800 811 811" },
        ],
    },
    ResourceGroup {
        key: "support",
        title: "Support Services",
        contacts: &[
            SupportContact { name: "Legal Aid", number: "1300 651 188" },
            SupportContact { name: "Safe Steps", number: "1800 015 188" },
            SupportContact { name: "Relationships Australia", number: "1300 364 277" },
        ],
    },
];

pub fn support_resources() -> &'static [ResourceGroup] {
    &SAFETY_RESOURCES
}

/// Look up a group by key (`emergency`, `hotlines`, `support`)
pub fn resource_group(key: &str) -> Option<&'static ResourceGroup> {
    SAFETY_RESOURCES.iter().find(|g| g.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emergency_group_first() {
        let groups = support_resources();
        assert_eq!(groups[0].key, "emergency");
        assert_eq!(groups[0].contacts[0].number, "000");
    }

    #[test]
    fn test_lookup_by_key() {
        let hotlines = resource_group("hotlines").unwrap();
        assert_eq!(hotlines.contacts.len(), 3);
        assert!(resource_group("unknown").is_none());
    }

    #[test]
    fn test_serializes_for_display() {
        let json = serde_json::to_value(support_resources()).unwrap();
        assert_eq!(json[2]["contacts"][0]["name"], "Legal Aid");
    }
}
