use serde::Serialize;
use std::rc::Rc;

use hextravel_engine::{
    AxialCoord, ChanceEncounterTable, HourCheck, TickOutcome, TravelSession, TravelState,
    travel_duration_to_hours,
};

use crate::scenario::Scenario;

/// Frames delivered per journey before the runner gives up.
const MAX_FRAMES: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub seed: u64,
    pub frame_ms: u32,
    /// Encounters the runner resumes after before leaving the party halted.
    pub auto_resume: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyStatus {
    Arrived,
    /// Stopped by an encounter once the resume budget ran out.
    Halted,
    /// Never started; the route has fewer than two hexes.
    NoRoute,
    Stalled,
}

/// Everything observed while driving one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct JourneyReport {
    pub scenario: String,
    pub seed: u64,
    pub status: JourneyStatus,
    pub start: AxialCoord,
    pub destination: Option<AxialCoord>,
    pub final_position: AxialCoord,
    pub path_len: usize,
    pub total_distance: u32,
    pub estimated_duration: Option<String>,
    pub estimated_hours: u32,
    pub hours_elapsed: u64,
    pub start_calendar: String,
    pub final_calendar: String,
    pub hexes_entered: Vec<usize>,
    pub frames: usize,
    pub resumes: u32,
    pub hour_checks: Vec<HourCheck>,
    pub failures: Vec<String>,
}

impl JourneyReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn encounters(&self) -> impl Iterator<Item = &HourCheck> {
        self.hour_checks.iter().filter(|check| check.triggered())
    }
}

/// Drive `scenario` to completion the way a host frame loop would.
#[must_use]
pub fn run_scenario(scenario: &Scenario, options: RunOptions) -> JourneyReport {
    let cfg = scenario.travel_config();
    let encounters = ChanceEncounterTable::from_seed(options.seed, cfg.encounters.clone());
    let start_clock = scenario.clock();
    let mut session = TravelSession::new(
        scenario.start,
        cfg,
        Rc::new(scenario.tile_map()),
        start_clock,
        encounters,
    );
    for &coord in &scenario.waypoints {
        session.handle_map_click(coord);
    }

    let route = session.state().route.clone();
    let estimate = session.estimated_duration();
    let estimated_hours = estimate.as_ref().map_or(0, travel_duration_to_hours);
    log::info!(
        "scenario '{}': {} hexes, estimate {}",
        scenario.name,
        route.path().len(),
        estimate.map_or_else(|| "none".to_string(), |d| d.to_string())
    );

    let mut hexes_entered = Vec::new();
    let mut frames = 0usize;
    let mut resumes = 0u32;
    let delta_ms = f64::from(options.frame_ms.max(1));

    let status = if session.start_travel() {
        loop {
            while session.frame_requested() && frames < MAX_FRAMES {
                frames += 1;
                match session.tick(delta_ms) {
                    TickOutcome::Entered { path_index } | TickOutcome::PausedAt { path_index } => {
                        hexes_entered.push(path_index);
                    }
                    TickOutcome::Finished { .. } => hexes_entered.push(route.last_index()),
                    TickOutcome::Moving { .. } | TickOutcome::Inactive => {}
                }
            }
            let animation = session.state().animation;
            if animation.is_idle() {
                break JourneyStatus::Arrived;
            }
            if !animation.is_paused() {
                break JourneyStatus::Stalled;
            }
            if resumes >= options.auto_resume {
                break JourneyStatus::Halted;
            }
            resumes += 1;
            log::debug!("resuming after encounter ({resumes}/{})", options.auto_resume);
            session.start_travel();
        }
    } else {
        JourneyStatus::NoRoute
    };

    let final_clock = *session.calendar();
    let state: TravelState = session.state().clone();
    let mut report = JourneyReport {
        scenario: scenario.name.clone(),
        seed: options.seed,
        status,
        start: scenario.start,
        destination: route.destination(),
        final_position: state.token.position,
        path_len: route.path().len(),
        total_distance: route.total_distance(),
        estimated_duration: estimate.map(|d| d.to_string()),
        estimated_hours,
        hours_elapsed: final_clock.elapsed_hours,
        start_calendar: start_clock.to_string(),
        final_calendar: final_clock.to_string(),
        hexes_entered,
        frames,
        resumes,
        hour_checks: session.take_hour_log(),
        failures: Vec::new(),
    };
    report.failures = check_invariants(&report);
    report
}

/// Journey invariants for completed runs.
fn check_invariants(report: &JourneyReport) -> Vec<String> {
    let mut failures = Vec::new();
    match report.status {
        JourneyStatus::Stalled => {
            failures.push(format!("journey stalled after {} frames", report.frames));
            return failures;
        }
        JourneyStatus::NoRoute => {
            failures.push("route has fewer than two hexes".to_string());
            return failures;
        }
        JourneyStatus::Halted => return failures,
        JourneyStatus::Arrived => {}
    }

    if report.destination != Some(report.final_position) {
        failures.push(format!(
            "token ended on {} instead of {}",
            report.final_position,
            report
                .destination
                .map_or_else(|| "nothing".to_string(), |d| d.to_string())
        ));
    }
    if report.hours_elapsed != u64::from(report.estimated_hours) {
        failures.push(format!(
            "calendar advanced {} hours but the estimate was {}",
            report.hours_elapsed, report.estimated_hours
        ));
    }
    let expected: Vec<usize> = (1..report.path_len).collect();
    if report.hexes_entered != expected {
        failures.push(format!(
            "hex-enter order {:?} does not cover path indexes 1..{}",
            report.hexes_entered, report.path_len
        ));
    }
    let hours: Vec<u32> = report.hour_checks.iter().map(|check| check.hour).collect();
    if hours.windows(2).any(|pair| pair[1] != pair[0] + 1) {
        failures.push(format!("hour checks out of order: {hours:?}"));
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{CalendarStart, get_scenario};
    use hextravel_engine::{Terrain, TravelConfig};

    fn options() -> RunOptions {
        RunOptions {
            seed: 1337,
            frame_ms: 50,
            auto_resume: 1_000,
        }
    }

    fn quiet(mut scenario: Scenario) -> Scenario {
        let mut cfg = TravelConfig::default_config();
        cfg.encounters.base_chance = 0.0;
        cfg.encounters.terrain_chance.clear();
        scenario.config = Some(cfg);
        scenario
    }

    #[test]
    fn builtin_scenarios_arrive_and_pass() {
        for (key, _) in crate::scenario::list_scenarios() {
            let report = run_scenario(&get_scenario(key).unwrap(), options());
            assert_eq!(report.status, JourneyStatus::Arrived, "{key}: {:?}", report.failures);
            assert!(report.passed(), "{key}: {:?}", report.failures);
        }
    }

    #[test]
    fn quiet_journey_spends_exactly_the_estimate() {
        let report = run_scenario(&quiet(get_scenario("demo").unwrap()), options());
        assert!(report.passed(), "{:?}", report.failures);
        assert_eq!(report.hours_elapsed, u64::from(report.estimated_hours));
        assert_eq!(report.encounters().count(), 0);
        assert_eq!(report.resumes, 0);
        assert_eq!(report.hour_checks.len(), report.estimated_hours as usize);
    }

    #[test]
    fn zero_resume_budget_halts_on_first_encounter() {
        let mut scenario = get_scenario("swamp-loop").unwrap();
        let mut cfg = TravelConfig::default_config();
        cfg.encounters.terrain_chance.insert(Terrain::Swamp, 1.0);
        scenario.config = Some(cfg);
        let report = run_scenario(
            &scenario,
            RunOptions {
                auto_resume: 0,
                ..options()
            },
        );
        assert_eq!(report.status, JourneyStatus::Halted);
        assert!(report.passed());
        assert_eq!(report.encounters().count(), 1);
    }

    #[test]
    fn encounters_on_the_last_hex_still_spend_every_hour() {
        let mut scenario = get_scenario("swamp-loop").unwrap();
        let mut cfg = TravelConfig::default_config();
        cfg.encounters.base_chance = 1.0;
        cfg.encounters.terrain_chance.clear();
        scenario.config = Some(cfg);
        let report = run_scenario(&scenario, options());
        assert_eq!(report.status, JourneyStatus::Arrived);
        assert!(report.passed(), "{:?}", report.failures);
        assert_eq!(report.hours_elapsed, u64::from(report.estimated_hours));
        assert_eq!(report.encounters().count(), report.estimated_hours as usize);
    }

    #[test]
    fn same_seed_same_report() {
        let scenario = get_scenario("mountain-pass").unwrap();
        let a = run_scenario(&scenario, options());
        let b = run_scenario(&scenario, options());
        assert_eq!(a.hour_checks, b.hour_checks);
        assert_eq!(a.final_calendar, b.final_calendar);
    }

    #[test]
    fn single_hex_route_is_reported() {
        let scenario = Scenario {
            name: "stay".to_string(),
            description: String::new(),
            start: AxialCoord::ORIGIN,
            waypoints: vec![AxialCoord::ORIGIN],
            default_terrain: Terrain::Plains,
            tiles: Vec::new(),
            config: None,
            calendar: CalendarStart::default(),
        };
        let report = run_scenario(&scenario, options());
        assert_eq!(report.status, JourneyStatus::NoRoute);
        assert!(!report.passed());
    }
}
