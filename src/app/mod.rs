// src/app/mod.rs

pub mod console;
pub mod input;

use anyhow::Result;
use chrono::{Local, NaiveDateTime};

use crate::app::console::{Console, ConsoleError, Reply};
use crate::app::input::{CommuteRequest, RawInput, validate};
use crate::plan::CommutePlan;
use crate::route::{Coordinate, Lookup, RouteQuery, RouteSummary, RoutingError, RoutingProvider};

// ============================================================================
// Console Text
// ============================================================================

pub const PROMPT_START: &str = "📍 Start address: ";
pub const PROMPT_DESTINATION: &str = "🏁 Destination: ";
pub const PROMPT_ARRIVAL: &str = "🕘 Arrival time (YYYY-MM-DDTHH:MM:SS): ";
pub const PROMPT_MODE: &str = "🚗 Travel mode [car/bicycle/pedestrian] (default: car): ";
pub const PROMPT_AGAIN: &str = "Plan another commute? (yes/no): ";

pub const MSG_LOOKING_UP: &str = "🔍 Looking up addresses...";
pub const MSG_ADDRESS_NOT_FOUND: &str = "❌ Could not find one of those addresses. Please try again.";
pub const MSG_NO_ROUTE: &str = "❌ Could not calculate a route for that trip. Please try again.";
pub const MSG_UNEXPECTED: &str = "❌ Something went wrong. Please try again.";
pub const MSG_GOODBYE: &str = "👋 Goodbye! Safe travels.";
pub const MSG_INTERRUPTED: &str = "👋 Interrupted. Goodbye!";

// ============================================================================
// State Machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Answered anything but `yes` at the repeat prompt.
    Declined,
    /// Ctrl-C at a prompt.
    Interrupted,
    /// Input stream ended.
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Input,
    Lookup(CommuteRequest),
    Route {
        request: CommuteRequest,
        start: Coordinate,
        end: Coordinate,
    },
    Display {
        request: CommuteRequest,
        summary: RouteSummary,
        plan: CommutePlan,
    },
    Confirm,
    Exit(ExitReason),
}

/// Interactive loop: prompt, validate, geocode, route, show, repeat.
///
/// Every failed lookup or route sends the user back to [`Stage::Input`].
/// Errors nobody classified are reported without detail and the loop carries
/// on. Only a console that can no longer be read or written ends
/// [`Planner::run`] with an error.
pub struct Planner<P, C> {
    provider: P,
    console: C,
    clock: Box<dyn Fn() -> NaiveDateTime>,
}

impl<P: RoutingProvider, C: Console> Planner<P, C> {
    pub fn new(provider: P, console: C) -> Self {
        Self {
            provider,
            console,
            clock: Box::new(|| Local::now().naive_local()),
        }
    }

    /// Replaces the wall clock used to reject arrival times in the past.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn run(&mut self) -> Result<ExitReason> {
        let mut stage = Stage::Input;

        loop {
            if let Stage::Exit(reason) = stage {
                let farewell = match reason {
                    ExitReason::Interrupted => MSG_INTERRUPTED,
                    ExitReason::Declined | ExitReason::Closed => MSG_GOODBYE,
                };
                self.console.say(farewell)?;
                tracing::info!(?reason, "Planner finished");
                return Ok(reason);
            }

            stage = match self.step(stage) {
                Ok(next) => next,
                Err(err)
                    if err
                        .downcast_ref::<ConsoleError>()
                        .is_some_and(ConsoleError::is_fatal) =>
                {
                    return Err(err);
                }
                Err(err) => {
                    tracing::error!(error = ?err, "Unexpected failure, restarting input");
                    self.console.say(MSG_UNEXPECTED)?;
                    Stage::Input
                }
            };
        }
    }

    /// Performs exactly one transition.
    pub fn step(&mut self, stage: Stage) -> Result<Stage> {
        match stage {
            Stage::Input => self.collect_input(),
            Stage::Lookup(request) => self.lookup(request),
            Stage::Route {
                request,
                start,
                end,
            } => self.route(request, start, end),
            Stage::Display {
                request,
                summary,
                plan,
            } => {
                self.console.say("")?;
                self.console.say(&format!(
                    "🗺️  {} → {} ({})",
                    request.start, request.destination, request.mode
                ))?;
                self.console.say(&plan.display())?;
                if let Some(details) = summary.details() {
                    self.console.say(&details)?;
                }
                self.console.say("")?;
                Ok(Stage::Confirm)
            }
            Stage::Confirm => Ok(match self.console.prompt(PROMPT_AGAIN)? {
                Reply::Line(answer) if answer.trim().eq_ignore_ascii_case("yes") => Stage::Input,
                Reply::Line(_) => Stage::Exit(ExitReason::Declined),
                Reply::Interrupted => Stage::Exit(ExitReason::Interrupted),
                Reply::Closed => Stage::Exit(ExitReason::Closed),
            }),
            Stage::Exit(reason) => Ok(Stage::Exit(reason)),
        }
    }

    fn collect_input(&mut self) -> Result<Stage> {
        let mut answers = Vec::with_capacity(4);
        for label in [PROMPT_START, PROMPT_DESTINATION, PROMPT_ARRIVAL, PROMPT_MODE] {
            match self.console.prompt(label)? {
                Reply::Line(line) => answers.push(line),
                Reply::Interrupted => return Ok(Stage::Exit(ExitReason::Interrupted)),
                Reply::Closed => return Ok(Stage::Exit(ExitReason::Closed)),
            }
        }

        let mut answers = answers.into_iter();
        let raw = RawInput {
            start: answers.next().unwrap_or_default(),
            destination: answers.next().unwrap_or_default(),
            arrival: answers.next().unwrap_or_default(),
            mode: answers.next().unwrap_or_default(),
        };

        match validate(&raw, (self.clock)()) {
            Ok(request) => Ok(Stage::Lookup(request)),
            Err(err) => {
                tracing::debug!(error = %err, "Rejected input");
                self.console.say(&format!("❌ {err}"))?;
                Ok(Stage::Input)
            }
        }
    }

    fn lookup(&mut self, request: CommuteRequest) -> Result<Stage> {
        self.console.say(MSG_LOOKING_UP)?;

        let Some(start) = self.resolve(&request.start)? else {
            self.console.say(MSG_ADDRESS_NOT_FOUND)?;
            return Ok(Stage::Input);
        };
        let Some(end) = self.resolve(&request.destination)? else {
            self.console.say(MSG_ADDRESS_NOT_FOUND)?;
            return Ok(Stage::Input);
        };

        Ok(Stage::Route {
            request,
            start,
            end,
        })
    }

    /// `Ok(None)` covers both an empty result and a failed request.
    fn resolve(&mut self, address: &str) -> Result<Option<Coordinate>> {
        match self.provider.resolve_address(address) {
            Ok(Lookup::Found(coord)) => {
                tracing::debug!(address, %coord, "Address resolved");
                Ok(Some(coord))
            }
            Ok(Lookup::NotFound) => {
                tracing::info!(address, "Address not found");
                Ok(None)
            }
            Err(err @ RoutingError::InvalidUrl(_)) => Err(err.into()),
            Err(err) => {
                tracing::warn!(address, error = %err, "Geocoding request failed");
                Ok(None)
            }
        }
    }

    fn route(&mut self, request: CommuteRequest, start: Coordinate, end: Coordinate) -> Result<Stage> {
        let query = RouteQuery {
            start,
            end,
            arrive_at: request.arrive_at,
            mode: request.mode,
        };

        match self.provider.compute_route(&query) {
            Ok(summary) => {
                tracing::debug!(?summary, "Route computed");
                let plan = CommutePlan::new(summary.travel_seconds, request.arrive_at);
                Ok(Stage::Display {
                    request,
                    summary,
                    plan,
                })
            }
            Err(err @ RoutingError::InvalidUrl(_)) => Err(err.into()),
            Err(err) => {
                tracing::warn!(%start, %end, error = %err, "Routing request failed");
                self.console.say(MSG_NO_ROUTE)?;
                Ok(Stage::Input)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use std::io;

    use super::*;
    use crate::app::console::ScriptedConsole;
    use crate::plan::TravelMode;

    const ARRIVAL: &str = "2030-01-01T09:00:00";

    fn fixed_now() -> NaiveDateTime {
        input::parse_arrival("2029-06-01T08:00:00").unwrap()
    }

    /// Provider fake: addresses map to queued lookups, routes are queued.
    #[derive(Default)]
    struct FakeProvider {
        lookups: RefCell<VecDeque<Result<Lookup, RoutingError>>>,
        routes: RefCell<VecDeque<Result<RouteSummary, RoutingError>>>,
        lookup_calls: Cell<usize>,
        route_queries: RefCell<Vec<RouteQuery>>,
    }

    impl FakeProvider {
        fn found(self, lat: f64, lon: f64) -> Self {
            self.lookups
                .borrow_mut()
                .push_back(Ok(Lookup::Found(Coordinate::new(lat, lon))));
            self
        }

        fn lookup(self, result: Result<Lookup, RoutingError>) -> Self {
            self.lookups.borrow_mut().push_back(result);
            self
        }

        fn route(self, result: Result<RouteSummary, RoutingError>) -> Self {
            self.routes.borrow_mut().push_back(result);
            self
        }
    }

    impl RoutingProvider for FakeProvider {
        fn resolve_address(&self, _address: &str) -> Result<Lookup, RoutingError> {
            self.lookup_calls.set(self.lookup_calls.get() + 1);
            self.lookups
                .borrow_mut()
                .pop_front()
                .unwrap_or(Ok(Lookup::NotFound))
        }

        fn compute_route(&self, query: &RouteQuery) -> Result<RouteSummary, RoutingError> {
            self.route_queries.borrow_mut().push(query.clone());
            self.routes
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(RoutingError::NoRoute))
        }
    }

    fn planner(provider: &FakeProvider, console: ScriptedConsole) -> Planner<&FakeProvider, ScriptedConsole> {
        Planner::new(provider, console).with_clock(fixed_now)
    }

    fn valid_trip() -> [&'static str; 4] {
        ["123 Main St", "456 Oak Ave", ARRIVAL, ""]
    }

    fn said(console: &ScriptedConsole, needle: &str) -> usize {
        console
            .transcript()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }

    #[test]
    fn happy_path_shows_plan_and_exits_on_no() {
        let provider = FakeProvider::default()
            .found(40.0, -73.0)
            .found(40.5, -73.5)
            .route(Ok(RouteSummary::from_seconds(1800)));
        let mut console = ScriptedConsole::new(valid_trip());
        console.push_lines(["no"]);

        let mut planner = planner(&provider, console);
        assert_eq!(planner.run().unwrap(), ExitReason::Declined);

        let console = planner.console();
        assert_eq!(said(console, "⏰ 30 mins | 🚀 Leave by: 08:30 AM"), 1);
        assert_eq!(console.transcript().last().unwrap(), MSG_GOODBYE);

        let queries = provider.route_queries.borrow();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].start, Coordinate::new(40.0, -73.0));
        assert_eq!(queries[0].end, Coordinate::new(40.5, -73.5));
        assert_eq!(queries[0].mode, TravelMode::Car);
        assert_eq!(queries[0].arrive_at, input::parse_arrival(ARRIVAL).unwrap());
    }

    #[test]
    fn invalid_input_never_reaches_the_provider() {
        let provider = FakeProvider::default();
        let console = ScriptedConsole::new([
            "ab", "456 Oak Ave", ARRIVAL, "",
            "123 Main St", "xy", ARRIVAL, "",
            "123 Main St", "456 Oak Ave", "2020-01-01T09:00:00", "",
            "123 Main St", "456 Oak Ave", "whenever", "",
            "123 Main St", "456 Oak Ave", ARRIVAL, "boat",
        ]);

        let mut planner = planner(&provider, console);
        assert_eq!(planner.run().unwrap(), ExitReason::Closed);

        assert_eq!(provider.lookup_calls.get(), 0);
        let console = planner.console();
        assert_eq!(said(console, "at least 3 characters"), 2);
        assert_eq!(said(console, "in the future"), 1);
        assert_eq!(said(console, "is not valid"), 1);
        assert_eq!(said(console, "'boat' is not supported"), 1);
        // five full rounds of four prompts, then the closed stream
        assert_eq!(console.prompts(), 21);
    }

    #[test]
    fn unknown_address_returns_to_input() {
        let provider = FakeProvider::default()
            .found(40.0, -73.0)
            .lookup(Ok(Lookup::NotFound));
        let console = ScriptedConsole::new(valid_trip());

        let mut planner = planner(&provider, console);
        assert_eq!(planner.run().unwrap(), ExitReason::Closed);

        assert_eq!(said(planner.console(), MSG_ADDRESS_NOT_FOUND), 1);
        assert!(provider.route_queries.borrow().is_empty());
        // re-prompted for the start address after the failure
        assert_eq!(planner.console().prompts(), 5);
    }

    #[test]
    fn first_address_not_found_skips_second_lookup() {
        let provider = FakeProvider::default().lookup(Ok(Lookup::NotFound));
        let console = ScriptedConsole::new(valid_trip());

        let mut planner = planner(&provider, console);
        planner.run().unwrap();

        assert_eq!(provider.lookup_calls.get(), 1);
        assert_eq!(said(planner.console(), MSG_ADDRESS_NOT_FOUND), 1);
    }

    #[test]
    fn lookup_transport_failure_looks_like_not_found() {
        let provider = FakeProvider::default().lookup(Err(RoutingError::Timeout));
        let console = ScriptedConsole::new(valid_trip());

        let mut planner = planner(&provider, console);
        planner.run().unwrap();

        assert_eq!(said(planner.console(), MSG_ADDRESS_NOT_FOUND), 1);
        assert_eq!(said(planner.console(), MSG_UNEXPECTED), 0);
    }

    #[test]
    fn missing_route_returns_to_input() {
        let provider = FakeProvider::default()
            .found(40.0, -73.0)
            .found(41.0, -74.0)
            .route(Err(RoutingError::NoRoute));
        let console = ScriptedConsole::new(valid_trip());

        let mut planner = planner(&provider, console);
        assert_eq!(planner.run().unwrap(), ExitReason::Closed);

        assert_eq!(said(planner.console(), MSG_NO_ROUTE), 1);
        assert_eq!(said(planner.console(), "Leave by"), 0);
    }

    #[test]
    fn provider_rejection_is_a_routing_failure() {
        let provider = FakeProvider::default()
            .found(40.0, -73.0)
            .found(41.0, -74.0)
            .route(Err(RoutingError::Status {
                status: 400,
                message: "arriveAt is in the past".into(),
            }));
        let console = ScriptedConsole::new(valid_trip());

        let mut planner = planner(&provider, console);
        planner.run().unwrap();

        assert_eq!(said(planner.console(), MSG_NO_ROUTE), 1);
        assert_eq!(said(planner.console(), "arriveAt"), 0);
    }

    #[test]
    fn route_timeout_is_a_routing_failure() {
        let provider = FakeProvider::default()
            .found(40.0, -73.0)
            .found(41.0, -74.0)
            .route(Err(RoutingError::Timeout));
        let console = ScriptedConsole::new(valid_trip());

        let mut planner = planner(&provider, console);
        assert_eq!(planner.run().unwrap(), ExitReason::Closed);

        assert_eq!(said(planner.console(), MSG_NO_ROUTE), 1);
        assert_eq!(said(planner.console(), MSG_UNEXPECTED), 0);
        assert_eq!(planner.console().prompts(), 5);
    }

    #[test]
    fn route_details_follow_the_plan() {
        let provider = FakeProvider::default()
            .found(40.0, -73.0)
            .found(40.5, -73.5)
            .route(Ok(RouteSummary {
                travel_seconds: 1800,
                length_meters: Some(12_345),
                traffic_delay_seconds: Some(300),
            }));
        let mut console = ScriptedConsole::new(valid_trip());
        console.push_lines(["no"]);

        let mut planner = planner(&provider, console);
        planner.run().unwrap();

        let transcript = planner.console().transcript();
        let plan_at = transcript
            .iter()
            .position(|line| line.contains("Leave by"))
            .unwrap();
        assert_eq!(
            transcript[plan_at + 1],
            "🛣️  12.3 km, including 5 mins of traffic delay"
        );
    }

    #[test]
    fn undecodable_line_restarts_input() {
        let provider = FakeProvider::default()
            .found(40.0, -73.0)
            .found(40.5, -73.5)
            .route(Ok(RouteSummary::from_seconds(1800)));
        let mut console = ScriptedConsole::new(["123 Main St"]);
        console
            .push_error(ConsoleError::Undecodable)
            .push_lines(valid_trip())
            .push_lines(["no"]);

        let mut planner = planner(&provider, console);
        assert_eq!(planner.run().unwrap(), ExitReason::Declined);

        let console = planner.console();
        assert_eq!(said(console, MSG_UNEXPECTED), 1);
        assert_eq!(said(console, "⏰ 30 mins | 🚀 Leave by: 08:30 AM"), 1);
        // two prompts before the bad line, then a full trip and the repeat prompt
        assert_eq!(console.prompts(), 2 + 4 + 1);
    }

    #[test]
    fn broken_console_ends_the_run() {
        let provider = FakeProvider::default();
        let mut console = ScriptedConsole::new(["123 Main St"]);
        console.push_error(ConsoleError::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "stdin closed under us",
        )));

        let mut planner = planner(&provider, console);
        let err = planner.run().unwrap_err();

        assert!(err.downcast_ref::<ConsoleError>().is_some_and(ConsoleError::is_fatal));
        assert_eq!(said(planner.console(), MSG_UNEXPECTED), 0);
        assert_eq!(provider.lookup_calls.get(), 0);
    }

    #[test]
    fn unclassified_failure_is_reported_generically() {
        let bad_url = url::Url::parse("not a url").unwrap_err();
        let provider = FakeProvider::default().lookup(Err(RoutingError::InvalidUrl(bad_url)));
        let console = ScriptedConsole::new(valid_trip());

        let mut planner = planner(&provider, console);
        assert_eq!(planner.run().unwrap(), ExitReason::Closed);

        let console = planner.console();
        assert_eq!(said(console, MSG_UNEXPECTED), 1);
        assert_eq!(said(console, "URL"), 0);
        assert_eq!(console.prompts(), 5);
    }

    #[test]
    fn interrupt_at_any_prompt_exits_immediately() {
        for answered in 0..4 {
            let provider = FakeProvider::default();
            let mut console = ScriptedConsole::new(valid_trip().into_iter().take(answered));
            console.push(Reply::Interrupted).push_lines(valid_trip());

            let mut planner = planner(&provider, console);
            assert_eq!(planner.run().unwrap(), ExitReason::Interrupted);

            let console = planner.console();
            assert_eq!(console.prompts(), answered + 1);
            assert_eq!(console.transcript().last().unwrap(), MSG_INTERRUPTED);
            assert_eq!(provider.lookup_calls.get(), 0);
        }
    }

    #[test]
    fn interrupt_at_repeat_prompt() {
        let provider = FakeProvider::default()
            .found(40.0, -73.0)
            .found(40.5, -73.5)
            .route(Ok(RouteSummary::from_seconds(600)));
        let mut console = ScriptedConsole::new(valid_trip());
        console.push(Reply::Interrupted);

        let mut planner = planner(&provider, console);
        assert_eq!(planner.run().unwrap(), ExitReason::Interrupted);
        assert_eq!(planner.console().transcript().last().unwrap(), MSG_INTERRUPTED);
    }

    #[test]
    fn only_yes_repeats() {
        for (answer, expected) in [
            ("yes", 2),
            ("YES", 2),
            (" Yes ", 2),
            ("y", 1),
            ("", 1),
            ("sure", 1),
        ] {
            let provider = FakeProvider::default()
                .found(40.0, -73.0)
                .found(40.5, -73.5)
                .route(Ok(RouteSummary::from_seconds(1800)));
            let mut console = ScriptedConsole::new(valid_trip());
            console.push_lines([answer]);

            let mut planner = planner(&provider, console);
            planner.run().unwrap();

            // a repeat asks for the start address once more
            let prompts = planner.console().prompts();
            assert_eq!(prompts, 4 + expected, "answer = {answer:?}");
        }
    }

    #[test]
    fn repeated_trip_renders_identically() {
        let provider = FakeProvider::default()
            .found(40.0, -73.0)
            .found(40.5, -73.5)
            .route(Ok(RouteSummary::from_seconds(1800)))
            .found(40.0, -73.0)
            .found(40.5, -73.5)
            .route(Ok(RouteSummary::from_seconds(1800)));
        let mut console = ScriptedConsole::new(valid_trip());
        console.push_lines(["yes"]).push_lines(valid_trip()).push_lines(["no"]);

        let mut planner = planner(&provider, console);
        assert_eq!(planner.run().unwrap(), ExitReason::Declined);

        let results: Vec<&String> = planner
            .console()
            .transcript()
            .iter()
            .filter(|line| line.contains("Leave by"))
            .collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], results[1]);
    }

    #[test]
    fn step_is_a_single_transition() {
        let provider = FakeProvider::default()
            .found(40.0, -73.0)
            .found(40.5, -73.5)
            .route(Ok(RouteSummary::from_seconds(1800)));
        let mut planner = planner(&provider, ScriptedConsole::new(valid_trip()));

        let stage = planner.step(Stage::Input).unwrap();
        let Stage::Lookup(request) = stage.clone() else {
            panic!("expected lookup, got {stage:?}");
        };
        assert_eq!(request.mode, TravelMode::Car);

        let stage = planner.step(stage).unwrap();
        assert!(matches!(stage, Stage::Route { .. }));

        let stage = planner.step(stage).unwrap();
        let Stage::Display { ref plan, .. } = stage else {
            panic!("expected display, got {stage:?}");
        };
        assert_eq!(plan.minutes(), 30);

        assert_eq!(planner.step(stage).unwrap(), Stage::Confirm);
        assert_eq!(
            planner.step(Stage::Confirm).unwrap(),
            Stage::Exit(ExitReason::Closed)
        );
        assert_eq!(
            planner.step(Stage::Exit(ExitReason::Declined)).unwrap(),
            Stage::Exit(ExitReason::Declined)
        );
    }
}
