//! Meal scheduling decisions.
//!
//! Every poll tick the scheduler looks at the appliance once and decides
//! whether to leave it alone, start cooking now, or start with a delay so
//! the food is ready at the usual mealtime of the next meal window. It also
//! watches for food kept warm for too long without the appliance being
//! unplugged.
//!
//! All state lives in [`SchedulerState`], owned by the [`Scheduler`] and only
//! touched by [`Scheduler::tick`].

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::config::{CookerConfig, MealWindow};
use crate::data::OperationMode;
use crate::device::Appliance;
use crate::error::Result;
use crate::notify::Notifier;
use crate::protocol::profile::MAX_DELAYED_START_MINUTES;
use crate::protocol::{ProfileOptions, ProfileType};

/// State carried from one tick to the next.
///
/// Held in memory only; a restarted process starts from the default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchedulerState {
    /// A start was issued (or the appliance was found busy) since it last came online.
    pub scheduled: bool,
    /// When the current keep-warm episode began.
    pub keep_warm_since: Option<NaiveDateTime>,
    /// Mode seen on the last tick the appliance was online.
    pub last_mode: Option<OperationMode>,
    /// Keep-warm reminders pushed during the current episode.
    pub unplugged_push_count: u32,
}

/// What the scheduling step of a tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Nothing to do: the scheduled flag already matches the online state.
    Idle,
    /// The appliance went offline after being scheduled; it will be
    /// re-evaluated when it comes back.
    Unplugged,
    /// The appliance is already busy, which counts as scheduled.
    AlreadyActive(OperationMode),
    /// Cooking started immediately inside a meal window.
    StartedNow {
        /// Profile started.
        profile: ProfileType,
    },
    /// Cooking scheduled to finish at the usual time of an upcoming window.
    DelayedStart {
        /// Profile scheduled.
        profile: ProfileType,
        /// Delay before the program is due, in minutes.
        minutes: u16,
        /// Expected completion time.
        ready_at: NaiveDateTime,
    },
    /// No meal window is open or ahead today.
    NoWindow,
}

/// Poll-tick decision engine.
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: CookerConfig,
    state: SchedulerState,
}

impl Scheduler {
    /// Create a scheduler with fresh state.
    pub fn new(config: CookerConfig) -> Self {
        Self::with_state(config, SchedulerState::default())
    }

    /// Create a scheduler resuming from `state`.
    pub fn with_state(config: CookerConfig, state: SchedulerState) -> Self {
        Self { config, state }
    }

    /// Current state.
    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// The appliance configuration in use.
    pub fn config(&self) -> &CookerConfig {
        &self.config
    }

    /// Run one poll tick at wall-clock time `now`.
    ///
    /// # Errors
    ///
    /// Appliance command failures (start/stop) are returned; push failures
    /// are only logged.
    pub async fn tick<A, N>(&mut self, appliance: &A, notifier: &N, now: NaiveDateTime) -> Result<Decision>
    where
        A: Appliance + ?Sized,
        N: Notifier + ?Sized,
    {
        let mode = appliance.current_mode().await;
        debug!(?mode, state = ?self.state, "Tick");

        self.track_keep_warm(mode, now);

        if self.config.unplugged_check.enabled {
            self.check_unplugged(appliance, notifier, now).await?;
        }

        self.schedule(mode, appliance, notifier, now).await
    }

    fn track_keep_warm(&mut self, mode: Option<OperationMode>, now: NaiveDateTime) {
        let Some(mode) = mode else {
            self.clear_keep_warm();
            return;
        };

        if mode.is_keeping_warm() {
            if matches!(self.state.last_mode, None | Some(OperationMode::Running)) {
                self.state.keep_warm_since = Some(now);
            }
        } else {
            self.clear_keep_warm();
        }

        self.state.last_mode = Some(mode);
    }

    fn clear_keep_warm(&mut self) {
        self.state.keep_warm_since = None;
        self.state.unplugged_push_count = 0;
    }

    async fn check_unplugged<A, N>(&mut self, appliance: &A, notifier: &N, now: NaiveDateTime) -> Result<()>
    where
        A: Appliance + ?Sized,
        N: Notifier + ?Sized,
    {
        let Some(since) = self.state.keep_warm_since else {
            return Ok(());
        };

        let check = &self.config.unplugged_check;
        if now - since <= Duration::minutes(i64::from(check.max_duration)) {
            return Ok(());
        }

        warn!(
            "{} has been keeping warm without being unplugged ({} - {})",
            self.config.name,
            since.format("%H:%M"),
            now.format("%H:%M")
        );

        if self.state.unplugged_push_count < check.max_reminder_count {
            self.state.unplugged_push_count += 1;
            notifier
                .push(
                    &self.config.name,
                    "Still keeping warm and not unplugged for a long time, please check!",
                )
                .await;
        }

        if check.auto_stop {
            info!("Stopping keep-warm automatically");
            appliance.stop().await?;
            notifier
                .push(
                    &self.config.name,
                    "Kept warm too long without being unplugged, the cooker has been stopped",
                )
                .await;
        }

        Ok(())
    }

    async fn schedule<A, N>(
        &mut self,
        mode: Option<OperationMode>,
        appliance: &A,
        notifier: &N,
        now: NaiveDateTime,
    ) -> Result<Decision>
    where
        A: Appliance + ?Sized,
        N: Notifier + ?Sized,
    {
        if self.state.scheduled == mode.is_some() {
            return Ok(Decision::Idle);
        }

        let Some(mode) = mode else {
            info!("{} is unplugged, will reschedule when it is back", self.config.name);
            self.state.scheduled = false;
            return Ok(Decision::Unplugged);
        };

        if !mode.is_waiting() {
            info!("{} is not waiting ({}), treating it as scheduled", self.config.name, mode);
            self.state.scheduled = true;
            return Ok(Decision::AlreadyActive(mode));
        }

        // First window that is either open or still ahead, in configured order.
        let window = self
            .config
            .meals
            .iter()
            .find(|w| w.contains(now) || w.is_ahead_of(now))
            .cloned();

        if let Some(window) = window {
            return if window.contains(now) {
                self.start_now(window, appliance, notifier).await
            } else {
                self.start_delayed(window, appliance, notifier, now).await
            };
        }

        debug!("No meal window open or ahead at {}", now.format("%H:%M"));
        Ok(Decision::NoWindow)
    }

    async fn start_now<A, N>(&mut self, window: MealWindow, appliance: &A, notifier: &N) -> Result<Decision>
    where
        A: Appliance + ?Sized,
        N: Notifier + ?Sized,
    {
        info!(
            "Inside meal window {} ~ {}, starting {} now",
            window.earliest, window.latest, window.profile
        );

        appliance
            .start(window.profile, ProfileOptions::keep_warm(self.config.auto_keep_warm))
            .await?;
        self.state.scheduled = true;

        notifier
            .push(
                &self.config.name,
                &format!("Cooking started automatically ({})", window.profile),
            )
            .await;

        Ok(Decision::StartedNow {
            profile: window.profile,
        })
    }

    async fn start_delayed<A, N>(
        &mut self,
        window: MealWindow,
        appliance: &A,
        notifier: &N,
        now: NaiveDateTime,
    ) -> Result<Decision>
    where
        A: Appliance + ?Sized,
        N: Notifier + ?Sized,
    {
        let minutes = window
            .minutes_until_usual(now)
            .clamp(0, i64::from(MAX_DELAYED_START_MINUTES)) as u16;
        let ready_at = window.usual.on_day_of(now);

        let options = ProfileOptions::keep_warm(self.config.auto_keep_warm).with_delayed_start(minutes);
        appliance.start(window.profile, options).await?;
        self.state.scheduled = true;

        info!(
            "{} is online, scheduled {} to be ready at {} ({} minutes from now)",
            self.config.name, window.profile, window.usual, minutes
        );

        let keep_warm = if self.config.auto_keep_warm {
            " and kept warm"
        } else {
            ""
        };
        notifier
            .push(
                &self.config.name,
                &format!(
                    "Scheduled {} to be ready at {} ({} minutes from now){}",
                    window.profile, window.usual, minutes, keep_warm
                ),
            )
            .await;

        Ok(Decision::DelayedStart {
            profile: window.profile,
            minutes,
            ready_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TimeOfDay, UnpluggedCheckConfig};
    use crate::device::MockAppliance;
    use crate::error::Error;
    use crate::notify::MockNotifier;
    use chrono::NaiveDate;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn window(profile: ProfileType, earliest: (u32, u32), usual: (u32, u32), latest: (u32, u32)) -> MealWindow {
        MealWindow {
            profile,
            earliest: TimeOfDay::new(earliest.0, earliest.1).unwrap(),
            usual: TimeOfDay::new(usual.0, usual.1).unwrap(),
            latest: TimeOfDay::new(latest.0, latest.1).unwrap(),
        }
    }

    fn breakfast() -> MealWindow {
        window(ProfileType::FineRice, (7, 0), (7, 30), (8, 0))
    }

    fn dinner() -> MealWindow {
        window(ProfileType::Congee, (17, 30), (18, 0), (19, 0))
    }

    fn config(meals: Vec<MealWindow>) -> CookerConfig {
        CookerConfig {
            name: "Cooker".to_string(),
            ip: [127, 0, 0, 1].into(),
            token: "00112233445566778899aabbccddeeff".to_string(),
            auto_keep_warm: true,
            unplugged_check: UnpluggedCheckConfig {
                enabled: true,
                max_duration: 120,
                max_reminder_count: 3,
                auto_stop: true,
            },
            meals,
        }
    }

    fn appliance_in(mode: Option<OperationMode>) -> MockAppliance {
        let mut appliance = MockAppliance::new();
        appliance.expect_current_mode().times(1).returning(move || mode);
        appliance
    }

    fn silent_notifier() -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_push().never();
        notifier
    }

    fn expect_push_containing(notifier: &mut MockNotifier, text: &'static str) {
        notifier
            .expect_push()
            .withf(move |title, message| title == "Cooker" && message.contains(text))
            .times(1)
            .returning(|_, _| true);
    }

    #[tokio::test]
    async fn test_starts_immediately_inside_window() {
        let mut appliance = appliance_in(Some(OperationMode::Waiting));
        appliance
            .expect_start()
            .with(eq(ProfileType::FineRice), eq(ProfileOptions::keep_warm(true)))
            .times(1)
            .returning(|_, _| Ok(()));
        let mut notifier = MockNotifier::new();
        expect_push_containing(&mut notifier, "started automatically (FineRice)");

        let mut scheduler = Scheduler::new(config(vec![breakfast(), dinner()]));
        let decision = scheduler.tick(&appliance, &notifier, at(7, 10)).await.unwrap();

        assert_eq!(
            decision,
            Decision::StartedNow {
                profile: ProfileType::FineRice
            }
        );
        assert!(scheduler.state().scheduled);
    }

    #[tokio::test]
    async fn test_delayed_start_before_window() {
        let mut appliance = appliance_in(Some(OperationMode::Waiting));
        appliance
            .expect_start()
            .with(
                eq(ProfileType::FineRice),
                eq(ProfileOptions::keep_warm(true).with_delayed_start(90)),
            )
            .times(1)
            .returning(|_, _| Ok(()));
        let mut notifier = MockNotifier::new();
        expect_push_containing(&mut notifier, "ready at 07:30 (90 minutes from now) and kept warm");

        let mut scheduler = Scheduler::new(config(vec![breakfast(), dinner()]));
        let decision = scheduler.tick(&appliance, &notifier, at(6, 0)).await.unwrap();

        assert_eq!(
            decision,
            Decision::DelayedStart {
                profile: ProfileType::FineRice,
                minutes: 90,
                ready_at: at(7, 30),
            }
        );
        assert!(scheduler.state().scheduled);
    }

    #[tokio::test]
    async fn test_delayed_start_for_next_window_of_the_day() {
        let mut appliance = appliance_in(Some(OperationMode::Waiting));
        appliance
            .expect_start()
            .with(
                eq(ProfileType::Congee),
                eq(ProfileOptions::keep_warm(true).with_delayed_start(480)),
            )
            .times(1)
            .returning(|_, _| Ok(()));
        let mut notifier = MockNotifier::new();
        expect_push_containing(&mut notifier, "Scheduled Gongee");

        let mut scheduler = Scheduler::new(config(vec![breakfast(), dinner()]));
        let decision = scheduler.tick(&appliance, &notifier, at(10, 0)).await.unwrap();

        assert!(matches!(decision, Decision::DelayedStart { minutes: 480, .. }));
    }

    #[tokio::test]
    async fn test_earlier_listed_upcoming_window_wins_over_open_window() {
        let mut appliance = appliance_in(Some(OperationMode::Waiting));
        appliance
            .expect_start()
            .with(
                eq(ProfileType::Congee),
                eq(ProfileOptions::keep_warm(true).with_delayed_start(615)),
            )
            .times(1)
            .returning(|_, _| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier.expect_push().times(1).returning(|_, _| true);

        let mut scheduler = Scheduler::new(config(vec![dinner(), breakfast()]));
        let decision = scheduler.tick(&appliance, &notifier, at(7, 45)).await.unwrap();

        assert_eq!(
            decision,
            Decision::DelayedStart {
                profile: ProfileType::Congee,
                minutes: 615,
                ready_at: at(18, 0),
            }
        );
    }

    #[tokio::test]
    async fn test_open_window_listed_first_starts_now() {
        let mut appliance = appliance_in(Some(OperationMode::Waiting));
        appliance
            .expect_start()
            .with(eq(ProfileType::FineRice), eq(ProfileOptions::keep_warm(true)))
            .times(1)
            .returning(|_, _| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier.expect_push().times(1).returning(|_, _| true);

        let mut scheduler = Scheduler::new(config(vec![breakfast(), dinner()]));
        let decision = scheduler.tick(&appliance, &notifier, at(7, 45)).await.unwrap();

        assert!(matches!(decision, Decision::StartedNow { .. }));
    }

    #[tokio::test]
    async fn test_first_upcoming_window_in_configured_order() {
        let lunch = window(ProfileType::QuickRice, (11, 30), (12, 0), (12, 30));
        let mut appliance = appliance_in(Some(OperationMode::Waiting));
        appliance
            .expect_start()
            .withf(|profile, _| *profile == ProfileType::Congee)
            .times(1)
            .returning(|_, _| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier.expect_push().times(1).returning(|_, _| true);

        let mut scheduler = Scheduler::new(config(vec![dinner(), lunch]));
        let decision = scheduler.tick(&appliance, &notifier, at(6, 0)).await.unwrap();

        assert!(matches!(
            decision,
            Decision::DelayedStart {
                profile: ProfileType::Congee,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_no_window_left_today() {
        let appliance = appliance_in(Some(OperationMode::Waiting));
        let notifier = silent_notifier();

        let mut scheduler = Scheduler::new(config(vec![breakfast(), dinner()]));
        let decision = scheduler.tick(&appliance, &notifier, at(20, 0)).await.unwrap();

        assert_eq!(decision, Decision::NoWindow);
        assert!(!scheduler.state().scheduled);
    }

    #[tokio::test]
    async fn test_scheduled_and_online_is_idle() {
        let appliance = appliance_in(Some(OperationMode::Waiting));
        let notifier = silent_notifier();
        let state = SchedulerState {
            scheduled: true,
            ..SchedulerState::default()
        };

        let mut scheduler = Scheduler::with_state(config(vec![breakfast()]), state);
        let decision = scheduler.tick(&appliance, &notifier, at(7, 10)).await.unwrap();

        assert_eq!(decision, Decision::Idle);
        assert!(scheduler.state().scheduled);
    }

    #[tokio::test]
    async fn test_offline_and_unscheduled_is_idle() {
        let appliance = appliance_in(None);
        let notifier = silent_notifier();

        let mut scheduler = Scheduler::new(config(vec![breakfast()]));
        let decision = scheduler.tick(&appliance, &notifier, at(7, 10)).await.unwrap();

        assert_eq!(decision, Decision::Idle);
    }

    #[tokio::test]
    async fn test_unplugged_after_scheduling_resets() {
        let appliance = appliance_in(None);
        let notifier = silent_notifier();
        let state = SchedulerState {
            scheduled: true,
            last_mode: Some(OperationMode::PreCook),
            ..SchedulerState::default()
        };

        let mut scheduler = Scheduler::with_state(config(vec![breakfast()]), state);
        let decision = scheduler.tick(&appliance, &notifier, at(7, 10)).await.unwrap();

        assert_eq!(decision, Decision::Unplugged);
        assert!(!scheduler.state().scheduled);
        assert_eq!(scheduler.state().last_mode, Some(OperationMode::PreCook));
    }

    #[tokio::test]
    async fn test_busy_appliance_counts_as_scheduled() {
        for mode in [
            OperationMode::Running,
            OperationMode::PreCook,
            OperationMode::AutoKeepWarm,
            OperationMode::Unknown,
        ] {
            let appliance = appliance_in(Some(mode));
            let notifier = silent_notifier();

            let mut scheduler = Scheduler::new(config(vec![breakfast()]));
            let decision = scheduler.tick(&appliance, &notifier, at(7, 10)).await.unwrap();

            assert_eq!(decision, Decision::AlreadyActive(mode));
            assert!(scheduler.state().scheduled);
        }
    }

    #[tokio::test]
    async fn test_failed_start_is_retried_next_tick() {
        let mut appliance = appliance_in(Some(OperationMode::Waiting));
        appliance
            .expect_start()
            .times(1)
            .returning(|_, _| Err(Error::Timeout));
        let notifier = silent_notifier();

        let mut scheduler = Scheduler::new(config(vec![breakfast()]));
        let result = scheduler.tick(&appliance, &notifier, at(7, 10)).await;

        assert!(matches!(result, Err(Error::Timeout)));
        assert!(!scheduler.state().scheduled);
    }

    #[tokio::test]
    async fn test_failed_push_does_not_abort_tick() {
        let mut appliance = appliance_in(Some(OperationMode::Waiting));
        appliance.expect_start().times(1).returning(|_, _| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier.expect_push().times(1).returning(|_, _| false);

        let mut scheduler = Scheduler::new(config(vec![breakfast()]));
        let decision = scheduler.tick(&appliance, &notifier, at(7, 10)).await.unwrap();

        assert!(matches!(decision, Decision::StartedNow { .. }));
        assert!(scheduler.state().scheduled);
    }

    #[tokio::test]
    async fn test_keep_warm_tracking_starts_after_cooking() {
        let notifier = silent_notifier();
        let mut scheduler = Scheduler::new(config(vec![]));

        scheduler
            .tick(&appliance_in(Some(OperationMode::Running)), &notifier, at(12, 0))
            .await
            .unwrap();
        assert_eq!(scheduler.state().keep_warm_since, None);

        scheduler
            .tick(&appliance_in(Some(OperationMode::AutoKeepWarm)), &notifier, at(12, 5))
            .await
            .unwrap();
        assert_eq!(scheduler.state().keep_warm_since, Some(at(12, 5)));

        scheduler
            .tick(&appliance_in(Some(OperationMode::AutoKeepWarm)), &notifier, at(12, 10))
            .await
            .unwrap();
        assert_eq!(scheduler.state().keep_warm_since, Some(at(12, 5)));
        assert_eq!(scheduler.state().last_mode, Some(OperationMode::AutoKeepWarm));
    }

    #[tokio::test]
    async fn test_keep_warm_tracking_at_startup() {
        let notifier = silent_notifier();
        let mut scheduler = Scheduler::new(config(vec![]));

        scheduler
            .tick(&appliance_in(Some(OperationMode::AutoKeepWarm)), &notifier, at(9, 0))
            .await
            .unwrap();
        assert_eq!(scheduler.state().keep_warm_since, Some(at(9, 0)));
    }

    #[tokio::test]
    async fn test_keep_warm_not_tracked_when_selected_manually() {
        let notifier = silent_notifier();
        let state = SchedulerState {
            last_mode: Some(OperationMode::Waiting),
            ..SchedulerState::default()
        };
        let mut scheduler = Scheduler::with_state(config(vec![]), state);

        scheduler
            .tick(&appliance_in(Some(OperationMode::AutoKeepWarm)), &notifier, at(9, 0))
            .await
            .unwrap();
        assert_eq!(scheduler.state().keep_warm_since, None);
    }

    #[tokio::test]
    async fn test_keep_warm_tracking_cleared() {
        let notifier = silent_notifier();
        let tracking = SchedulerState {
            scheduled: true,
            keep_warm_since: Some(at(12, 0)),
            last_mode: Some(OperationMode::AutoKeepWarm),
            unplugged_push_count: 2,
        };

        let mut scheduler = Scheduler::with_state(config(vec![]), tracking.clone());
        scheduler
            .tick(&appliance_in(Some(OperationMode::Waiting)), &notifier, at(12, 30))
            .await
            .unwrap();
        assert_eq!(scheduler.state().keep_warm_since, None);
        assert_eq!(scheduler.state().unplugged_push_count, 0);

        let mut scheduler = Scheduler::with_state(config(vec![]), tracking);
        scheduler
            .tick(&appliance_in(None), &notifier, at(12, 30))
            .await
            .unwrap();
        assert_eq!(scheduler.state().keep_warm_since, None);
        assert_eq!(scheduler.state().last_mode, Some(OperationMode::AutoKeepWarm));
    }

    #[tokio::test]
    async fn test_long_keep_warm_reminds_and_stops() {
        let state = SchedulerState {
            scheduled: true,
            last_mode: Some(OperationMode::Running),
            ..SchedulerState::default()
        };
        let mut scheduler = Scheduler::with_state(config(vec![]), state);

        scheduler
            .tick(
                &appliance_in(Some(OperationMode::AutoKeepWarm)),
                &silent_notifier(),
                at(12, 0),
            )
            .await
            .unwrap();

        let mut appliance = appliance_in(Some(OperationMode::AutoKeepWarm));
        appliance.expect_stop().times(1).returning(|| Ok(()));
        let mut notifier = MockNotifier::new();
        expect_push_containing(&mut notifier, "please check");
        expect_push_containing(&mut notifier, "has been stopped");

        let decision = scheduler.tick(&appliance, &notifier, at(14, 1)).await.unwrap();

        assert_eq!(decision, Decision::Idle);
        assert!(scheduler.state().scheduled);
        assert_eq!(scheduler.state().keep_warm_since, Some(at(12, 0)));
        assert_eq!(scheduler.state().unplugged_push_count, 1);
    }

    #[tokio::test]
    async fn test_keep_warm_within_limit_is_quiet() {
        let state = SchedulerState {
            scheduled: true,
            keep_warm_since: Some(at(12, 0)),
            last_mode: Some(OperationMode::AutoKeepWarm),
            unplugged_push_count: 0,
        };
        let mut scheduler = Scheduler::with_state(config(vec![]), state);

        scheduler
            .tick(
                &appliance_in(Some(OperationMode::AutoKeepWarm)),
                &silent_notifier(),
                at(14, 0),
            )
            .await
            .unwrap();
        assert_eq!(scheduler.state().unplugged_push_count, 0);
    }

    #[tokio::test]
    async fn test_keep_warm_reminders_are_capped() {
        let mut config = config(vec![]);
        config.unplugged_check.auto_stop = false;
        config.unplugged_check.max_reminder_count = 1;
        let state = SchedulerState {
            scheduled: true,
            keep_warm_since: Some(at(12, 0)),
            last_mode: Some(OperationMode::AutoKeepWarm),
            unplugged_push_count: 0,
        };
        let mut scheduler = Scheduler::with_state(config, state);

        let mut notifier = MockNotifier::new();
        expect_push_containing(&mut notifier, "please check");

        for minute in [5, 10, 15] {
            let appliance = appliance_in(Some(OperationMode::AutoKeepWarm));
            scheduler.tick(&appliance, &notifier, at(15, minute)).await.unwrap();
        }
        assert_eq!(scheduler.state().unplugged_push_count, 1);
    }

    proptest::proptest! {
        #[test]
        fn test_delayed_start_always_ready_at_usual_time(minute_of_day in 0u32..420) {
            let now = at(minute_of_day / 60, minute_of_day % 60);
            let expected = 450 - minute_of_day as u16;

            let mut appliance = appliance_in(Some(OperationMode::Waiting));
            appliance
                .expect_start()
                .with(
                    eq(ProfileType::FineRice),
                    eq(ProfileOptions::keep_warm(true).with_delayed_start(expected)),
                )
                .times(1)
                .returning(|_, _| Ok(()));
            let mut notifier = MockNotifier::new();
            notifier.expect_push().times(1).returning(|_, _| true);

            let mut scheduler = Scheduler::new(config(vec![breakfast()]));
            let decision = tokio_test::block_on(scheduler.tick(&appliance, &notifier, now)).unwrap();

            proptest::prop_assert_eq!(
                decision,
                Decision::DelayedStart {
                    profile: ProfileType::FineRice,
                    minutes: expected,
                    ready_at: at(7, 30),
                }
            );
        }
    }

    #[tokio::test]
    async fn test_keep_warm_check_disabled() {
        let mut config = config(vec![]);
        config.unplugged_check.enabled = false;
        let state = SchedulerState {
            scheduled: true,
            keep_warm_since: Some(at(6, 0)),
            last_mode: Some(OperationMode::AutoKeepWarm),
            unplugged_push_count: 0,
        };
        let mut scheduler = Scheduler::with_state(config, state);

        scheduler
            .tick(
                &appliance_in(Some(OperationMode::AutoKeepWarm)),
                &silent_notifier(),
                at(15, 0),
            )
            .await
            .unwrap();
        assert_eq!(scheduler.state().keep_warm_since, Some(at(6, 0)));
    }
}
