//! Field identifiers and their canonical names.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Indexed field names: `activities[2].start_date`, `locations[0]`.
static INDEXED_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(activities|locations)\[(\d+)\](?:\.([a-z_]+))?$").expect("valid regex")
});

/// A validatable field of the project draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    AssignedManager,
    BudgetTotal,
    StartDate,
    EndDate,
    GlobalObjectives,
    StrategicLines,
    Donors,
    Locations,
    Location(usize),
    Activities,
    ActivityStartDate(usize),
    ActivityEndDate(usize),
    ActivityBudget(usize),
    OverallProgress,
}

impl Field {
    /// Parse a canonical field name. Returns `None` for names with no rule.
    pub fn parse(name: &str) -> Option<Self> {
        let simple = match name {
            "name" => Some(Self::Name),
            "assigned_manager" => Some(Self::AssignedManager),
            "budget_total" => Some(Self::BudgetTotal),
            "start_date" => Some(Self::StartDate),
            "end_date" => Some(Self::EndDate),
            "global_objectives" => Some(Self::GlobalObjectives),
            "strategic_lines" => Some(Self::StrategicLines),
            "donors" => Some(Self::Donors),
            "locations" => Some(Self::Locations),
            "activities" => Some(Self::Activities),
            "overall_progress" => Some(Self::OverallProgress),
            _ => None,
        };
        if simple.is_some() {
            return simple;
        }

        let caps = INDEXED_FIELD_RE.captures(name)?;
        let index: usize = caps[2].parse().ok()?;
        match (&caps[1], caps.get(3).map(|m| m.as_str())) {
            ("locations", None) => Some(Self::Location(index)),
            ("activities", Some("start_date")) => Some(Self::ActivityStartDate(index)),
            ("activities", Some("end_date")) => Some(Self::ActivityEndDate(index)),
            ("activities", Some("budget_assigned")) => Some(Self::ActivityBudget(index)),
            _ => None,
        }
    }

    /// Canonical name used as the key in a [`super::FieldReport`].
    pub fn key(&self) -> String {
        match self {
            Self::Name => "name".to_string(),
            Self::AssignedManager => "assigned_manager".to_string(),
            Self::BudgetTotal => "budget_total".to_string(),
            Self::StartDate => "start_date".to_string(),
            Self::EndDate => "end_date".to_string(),
            Self::GlobalObjectives => "global_objectives".to_string(),
            Self::StrategicLines => "strategic_lines".to_string(),
            Self::Donors => "donors".to_string(),
            Self::Locations => "locations".to_string(),
            Self::Location(i) => format!("locations[{i}]"),
            Self::Activities => "activities".to_string(),
            Self::ActivityStartDate(i) => format!("activities[{i}].start_date"),
            Self::ActivityEndDate(i) => format!("activities[{i}].end_date"),
            Self::ActivityBudget(i) => format!("activities[{i}].budget_assigned"),
            Self::OverallProgress => "overall_progress".to_string(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_names() {
        assert_eq!(Field::parse("name"), Some(Field::Name));
        assert_eq!(Field::parse("budget_total"), Some(Field::BudgetTotal));
        assert_eq!(Field::parse("donors"), Some(Field::Donors));
    }

    #[test]
    fn parse_indexed_names() {
        assert_eq!(
            Field::parse("activities[3].start_date"),
            Some(Field::ActivityStartDate(3))
        );
        assert_eq!(
            Field::parse("activities[0].budget_assigned"),
            Some(Field::ActivityBudget(0))
        );
        assert_eq!(Field::parse("locations[12]"), Some(Field::Location(12)));
    }

    #[test]
    fn parse_unknown_names() {
        assert_eq!(Field::parse("favourite_colour"), None);
        assert_eq!(Field::parse("activities[x].start_date"), None);
        assert_eq!(Field::parse("activities[1].notes"), None);
        assert_eq!(Field::parse("locations[1].locality"), None);
        assert_eq!(Field::parse(""), None);
    }

    #[test]
    fn key_roundtrips_through_parse() {
        for field in [
            Field::Name,
            Field::AssignedManager,
            Field::EndDate,
            Field::Location(4),
            Field::ActivityEndDate(2),
            Field::ActivityBudget(9),
            Field::OverallProgress,
        ] {
            assert_eq!(Field::parse(&field.key()), Some(field));
        }
    }
}
