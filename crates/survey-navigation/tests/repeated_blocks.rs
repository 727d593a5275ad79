//! Navigation through a block repeated for each interviewable person

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use survey_model::{Direction, TargetSectionResult};
use survey_sections::{Condition, SectionGraph};
use survey_navigation::NavigationService;
use survey_test_utils::{
    complex_config, complex_service, section, section_in, values, FlowSimulator, InterviewBuilder,
};

fn household_done() -> InterviewBuilder {
    InterviewBuilder::new()
        .with_household()
        .completed("home", None)
        .completed("householdMembers", None)
}

fn first_person_done() -> InterviewBuilder {
    household_done()
        .completed("personsTrips", Some("personId1"))
        .completed("selectPerson", Some("personId1"))
        .completed("visitedPlaces", Some("personId1"))
        .completed("travelBehavior", Some("personId1"))
}

fn both_persons_done() -> InterviewBuilder {
    first_person_done()
        .completed("personsTrips", Some("personId2"))
        .completed("selectPerson", Some("personId2"))
        .completed("visitedPlaces", Some("personId2"))
        .completed("travelBehavior", Some("personId2"))
}

fn active(id: Value) -> survey_model::ValuesByPath {
    values(&[("response._activePersonId", id)])
}

mod init_navigation_state {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn starts_at_entry_without_history() {
        let result = complex_service()
            .init_navigation_state(&InterviewBuilder::new().with_household().build(), None, None)
            .unwrap();
        assert_eq!(result, TargetSectionResult::stay(section("home")));
    }

    #[test]
    fn resumes_at_last_visited_section_outside_block() {
        let snapshot = both_persons_done().started("end", None).build();
        let result = complex_service().init_navigation_state(&snapshot, None, None).unwrap();
        assert_eq!(result, TargetSectionResult::stay(section("end")));
    }

    #[test]
    fn resumes_in_iteration_and_activates_its_object() {
        let snapshot = first_person_done()
            .completed("personsTrips", Some("personId2"))
            .completed("selectPerson", Some("personId2"))
            .started("visitedPlaces", Some("personId2"))
            .build();
        let result = complex_service().init_navigation_state(&snapshot, None, None).unwrap();
        assert_eq!(result.target_section, section_in("visitedPlaces", "personId2"));
        assert_eq!(result.values_by_path, Some(active(json!("personId2"))));
    }

    #[test]
    fn requested_block_section_not_enabled() {
        let snapshot = first_person_done()
            .started("visitedPlaces", Some("personId2"))
            .active_person("personId2")
            .flag("tbDisabled")
            .build();
        let result = complex_service()
            .init_navigation_state(&snapshot, Some("travelBehavior"), None)
            .unwrap();
        assert_eq!(result, TargetSectionResult::stay(section_in("visitedPlaces", "personId2")));
    }

    #[test]
    fn requested_block_section_not_visible() {
        let snapshot = first_person_done()
            .started("visitedPlaces", Some("personId2"))
            .active_person("personId2")
            .flag("tbHidden")
            .build();
        let result = complex_service()
            .init_navigation_state(&snapshot, Some("travelBehavior"), None)
            .unwrap();
        assert_eq!(result, TargetSectionResult::stay(section_in("visitedPlaces", "personId2")));
    }

    #[test]
    fn requested_block_section_without_active_object_goes_to_selection() {
        let snapshot = both_persons_done().build();
        let result = complex_service()
            .init_navigation_state(&snapshot, Some("travelBehavior"), None)
            .unwrap();
        assert_eq!(result, TargetSectionResult::stay(section("selectPerson")));
    }

    #[test]
    fn requested_block_enters_first_iteration() {
        let snapshot = first_person_done()
            .started("visitedPlaces", Some("personId2"))
            .active_person("personId2")
            .build();
        let result = complex_service()
            .init_navigation_state(&snapshot, Some("personsTrips"), None)
            .unwrap();
        assert_eq!(result.target_section, section_in("selectPerson", "personId1"));
        assert_eq!(result.values_by_path, Some(active(json!("personId1"))));
    }

    #[test]
    fn selection_hidden_with_single_iteration() {
        let snapshot = InterviewBuilder::new()
            .with_persons(&["personId1"])
            .completed("home", None)
            .completed("householdMembers", None)
            .completed("personsTrips", Some("personId1"))
            .completed("visitedPlaces", Some("personId1"))
            .completed("travelBehavior", Some("personId1"))
            .build();
        let result = complex_service()
            .init_navigation_state(&snapshot, Some("personsTrips"), None)
            .unwrap();
        assert_eq!(result.target_section, section_in("visitedPlaces", "personId1"));
        assert_eq!(result.values_by_path, Some(active(json!("personId1"))));
    }
}

mod navigate {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn natural_flow_skips_selection() {
        let snapshot = household_done().build();
        let result = complex_service()
            .navigate(&snapshot, &section("householdMembers"), Direction::Forward)
            .unwrap();
        assert_eq!(result.target_section, section_in("visitedPlaces", "personId1"));
        assert_eq!(result.values_by_path, Some(active(json!("personId1"))));
    }

    #[test]
    fn end_of_first_iteration_enters_second_in_natural_flow() {
        let snapshot = first_person_done().active_person("personId1").build();
        let result = complex_service()
            .navigate(&snapshot, &section_in("travelBehavior", "personId1"), Direction::Forward)
            .unwrap();
        assert_eq!(result.target_section, section_in("visitedPlaces", "personId2"));
        assert_eq!(result.values_by_path, Some(active(json!("personId2"))));
    }

    #[test]
    fn revisited_iteration_shows_selection() {
        let snapshot = household_done()
            .completed("personsTrips", Some("personId1"))
            .completed("selectPerson", Some("personId1"))
            .started("visitedPlaces", Some("personId1"))
            .build();
        let result = complex_service()
            .navigate(&snapshot, &section("householdMembers"), Direction::Forward)
            .unwrap();
        assert_eq!(result.target_section, section_in("selectPerson", "personId1"));
        assert_eq!(result.values_by_path, Some(active(json!("personId1"))));
    }

    #[test]
    fn last_iteration_leaves_block() {
        let snapshot = both_persons_done().active_person("personId2").build();
        let result = complex_service()
            .navigate(&snapshot, &section_in("travelBehavior", "personId2"), Direction::Forward)
            .unwrap();
        assert_eq!(result.target_section, section("end"));
        assert_eq!(result.values_by_path, Some(active(Value::Null)));
    }

    #[test]
    fn completed_interview_still_enters_selection() {
        let snapshot = both_persons_done().completed("end", None).build();
        let result = complex_service()
            .navigate(&snapshot, &section("householdMembers"), Direction::Forward)
            .unwrap();
        assert_eq!(result.target_section, section_in("selectPerson", "personId1"));
    }

    #[test]
    fn backward_to_previous_iteration() {
        let snapshot = both_persons_done().build();
        let result = complex_service()
            .navigate(&snapshot, &section_in("selectPerson", "personId2"), Direction::Backward)
            .unwrap();
        assert_eq!(result.target_section, section_in("selectPerson", "personId1"));
        assert_eq!(result.values_by_path, Some(active(json!("personId1"))));
    }

    #[test]
    fn backward_from_first_iteration_leaves_block() {
        let snapshot = both_persons_done().build();
        let result = complex_service()
            .navigate(&snapshot, &section_in("selectPerson", "personId1"), Direction::Backward)
            .unwrap();
        assert_eq!(result.target_section, section("householdMembers"));
        assert_eq!(result.values_by_path, Some(active(Value::Null)));
    }

    #[test]
    fn next_section_in_same_iteration() {
        let snapshot = first_person_done().active_person("personId1").build();
        let result = complex_service()
            .navigate(&snapshot, &section_in("visitedPlaces", "personId1"), Direction::Forward)
            .unwrap();
        assert_eq!(result, TargetSectionResult::stay(section_in("travelBehavior", "personId1")));
    }

    #[test]
    fn skipped_last_section_moves_to_next_iteration() {
        let snapshot = household_done()
            .completed("visitedPlaces", Some("personId1"))
            .active_person("personId1")
            .flag("tbHidden")
            .build();
        let result = complex_service()
            .navigate(&snapshot, &section_in("visitedPlaces", "personId1"), Direction::Forward)
            .unwrap();
        assert_eq!(result.target_section, section_in("visitedPlaces", "personId2"));
        assert_eq!(result.values_by_path, Some(active(json!("personId2"))));
    }

    #[test]
    fn disabled_block_is_skipped() {
        let snapshot = household_done().flag("tripsDisabled").build();
        let result = complex_service()
            .navigate(&snapshot, &section("householdMembers"), Direction::Forward)
            .unwrap();
        assert_eq!(result, TargetSectionResult::stay(section("end")));
    }

    #[test]
    fn selection_section_follows_active_object() {
        let snapshot = both_persons_done().active_person("personId1").build();
        let result = complex_service()
            .navigate(&snapshot, &section_in("selectPerson", "personId2"), Direction::Forward)
            .unwrap();
        assert_eq!(result, TargetSectionResult::stay(section_in("visitedPlaces", "personId1")));
    }

    #[test]
    fn block_without_interviewable_person_is_skipped() {
        let snapshot = InterviewBuilder::new()
            .with_persons(&["personId3"])
            .completed("home", None)
            .completed("householdMembers", None)
            .build();
        let result = complex_service()
            .navigate(&snapshot, &section("householdMembers"), Direction::Forward)
            .unwrap();
        assert_eq!(result.target_section, section("end"));
    }
}

#[test]
fn fresh_interview_walks_every_iteration() {
    let mut config = complex_config();
    config.get_mut("travelBehavior").unwrap().hooks.is_section_visible =
        Some(Condition::truthy("household.persons.{iterationId}.skipBehavior").negate().into());
    let service = NavigationService::new(SectionGraph::new(config).unwrap());
    let snapshot = InterviewBuilder::new()
        .with_household()
        .set("household.persons.personId2.skipBehavior", json!(true))
        .build();

    let mut flow = FlowSimulator::new(service, snapshot);
    assert_eq!(flow.start(), section("home"));
    let visited = flow.run_forward(20);
    assert_eq!(
        visited,
        vec![
            section("householdMembers"),
            section_in("visitedPlaces", "personId1"),
            section_in("travelBehavior", "personId1"),
            section_in("visitedPlaces", "personId2"),
            section("end"),
        ]
    );
    assert_eq!(flow.snapshot.get_response("_activePersonId"), None);
}

#[test]
fn walking_back_from_end_reenters_block_at_first_iteration() {
    let mut flow = FlowSimulator::new(complex_service(), InterviewBuilder::new().with_household().build());
    flow.start();
    flow.run_forward(20);
    assert_eq!(flow.current, Some(section("end")));

    assert_eq!(flow.backward(), section_in("selectPerson", "personId1"));
    assert_eq!(flow.snapshot.get_str("_activePersonId"), Some("personId1"));
    assert_eq!(flow.backward(), section("householdMembers"));
    assert_eq!(flow.backward(), section("home"));
}
