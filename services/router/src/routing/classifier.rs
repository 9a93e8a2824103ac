//! Discriminant classification.

use fanout_events::{DiscriminantField, NotificationEvent};

use super::RoutingConfig;

/// The branch an event is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchId {
    /// Index into the known-value allow-list.
    Known(usize),
    /// The catch-all branch.
    Unmatched,
}

/// Maps a discriminant value to a branch.
///
/// Parameterized by the field it reads and the allow-list it matches
/// against; the same classifier serves route-by-app and route-by-type.
#[derive(Debug, Clone)]
pub struct Classifier {
    field: DiscriminantField,
    known: Vec<String>,
}

impl Classifier {
    pub fn new(field: DiscriminantField, known: Vec<String>) -> Self {
        Self { field, known }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.field, config.known_values.clone())
    }

    pub fn field(&self) -> DiscriminantField {
        self.field
    }

    pub fn known_values(&self) -> &[String] {
        &self.known
    }

    /// Number of known branches (K). The catch-all makes K+1 in total.
    pub fn branch_count(&self) -> usize {
        self.known.len()
    }

    /// Whether `discriminant` equals any known value.
    pub fn matches_any(&self, discriminant: Option<&str>) -> bool {
        discriminant.is_some_and(|d| self.known.iter().any(|k| k == d))
    }

    /// Catch-all predicate: the negation of [`Classifier::matches_any`].
    ///
    /// An absent discriminant is unmatched.
    pub fn is_unmatched(&self, discriminant: Option<&str>) -> bool {
        !self.matches_any(discriminant)
    }

    /// Classify a raw discriminant value.
    ///
    /// Known values are exact, case-sensitive equality tests against
    /// distinct constants, so at most one can match.
    pub fn classify(&self, discriminant: Option<&str>) -> BranchId {
        match discriminant.and_then(|d| self.known.iter().position(|k| k == d)) {
            Some(index) => BranchId::Known(index),
            None => BranchId::Unmatched,
        }
    }

    /// Classify an event by its configured discriminant field.
    pub fn classify_event(&self, event: &NotificationEvent) -> BranchId {
        self.classify(event.discriminant(self.field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn app_classifier() -> Classifier {
        Classifier::from_config(&RoutingConfig::default())
    }

    #[rstest]
    #[case(Some("app1"), BranchId::Known(0))]
    #[case(Some("app2"), BranchId::Known(1))]
    #[case(Some("app3"), BranchId::Known(2))]
    #[case(Some("unknown_app"), BranchId::Unmatched)]
    #[case(Some("APP1"), BranchId::Unmatched)]
    #[case(Some(" app1"), BranchId::Unmatched)]
    #[case(Some(""), BranchId::Unmatched)]
    #[case(None, BranchId::Unmatched)]
    fn test_classify(#[case] discriminant: Option<&str>, #[case] expected: BranchId) {
        assert_eq!(app_classifier().classify(discriminant), expected);
    }

    #[test]
    fn test_classify_event_reads_configured_field() {
        let event = NotificationEvent::builder()
            .id(1)
            .app("app1")
            .event_type("type2")
            .action("object.created")
            .build()
            .unwrap();

        let by_app = app_classifier();
        let by_type = Classifier::from_config(&RoutingConfig::for_field(DiscriminantField::Type));

        assert_eq!(by_app.classify_event(&event), BranchId::Known(0));
        assert_eq!(by_type.classify_event(&event), BranchId::Known(1));
    }

    #[test]
    fn test_event_without_configured_slot_is_unmatched() {
        let event = NotificationEvent::builder()
            .id(9)
            .app("app1")
            .action("object.created")
            .build()
            .unwrap();
        let by_type = Classifier::from_config(&RoutingConfig::for_field(DiscriminantField::Type));

        assert_eq!(by_type.classify_event(&event), BranchId::Unmatched);
    }

    #[test]
    fn test_known_values_get_distinct_branches() {
        let classifier = app_classifier();
        let branches: Vec<_> = classifier
            .known_values()
            .iter()
            .map(|v| classifier.classify(Some(v)))
            .collect();

        for (i, a) in branches.iter().enumerate() {
            for b in &branches[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    proptest! {
        #[test]
        fn classify_is_deterministic(value in ".{0,16}") {
            let classifier = app_classifier();
            prop_assert_eq!(
                classifier.classify(Some(&value)),
                classifier.classify(Some(&value))
            );
        }

        #[test]
        fn unmatched_branch_is_negation_of_known(value in ".{0,16}") {
            let classifier = app_classifier();
            let branch = classifier.classify(Some(&value));
            prop_assert_eq!(
                branch == BranchId::Unmatched,
                classifier.is_unmatched(Some(&value))
            );
        }

        #[test]
        fn unknown_values_go_to_catch_all(value in "[a-z_]{1,12}") {
            prop_assume!(!["app1", "app2", "app3"].contains(&value.as_str()));
            prop_assert_eq!(app_classifier().classify(Some(&value)), BranchId::Unmatched);
        }

        #[test]
        fn known_branch_indexes_are_in_range(value in prop::sample::select(vec!["app1", "app2", "app3"])) {
            let classifier = app_classifier();
            match classifier.classify(Some(value)) {
                BranchId::Known(index) => {
                    prop_assert!(index < classifier.branch_count());
                    prop_assert_eq!(classifier.known_values()[index].as_str(), value);
                }
                BranchId::Unmatched => prop_assert!(false, "known value routed to catch-all"),
            }
        }
    }
}
