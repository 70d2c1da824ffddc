//! Property-based tests for session controller tab operations.
//!
//! For any sequence of opens, background opens, closes, activations and
//! back/forward moves, the controller keeps its invariants: one tab per id,
//! an active document tab that actually exists, a location derived from the
//! active tab, and a persisted snapshot that matches the live state.

use std::collections::HashSet;
use std::time::Duration;

use docviewer::app::SessionController;
use docviewer::managers::navigation::{location_for, BrowserHistory, MemoryHistory};
use docviewer::managers::session_manager::{MemoryStorage, SessionManager, SessionManagerTrait};
use docviewer::managers::tab_manager::TabRegistryTrait;
use docviewer::types::tab::TabId;
use proptest::prelude::*;

/// Operations that can be performed on the controller.
#[derive(Debug, Clone)]
enum TabOp {
    Open(u8),
    OpenBackground(u8),
    Close(u8),
    Activate(u8),
    ActivateDashboard,
    Back,
    Forward,
    CloseAll,
}

/// Some ids carry characters that are reserved in a URL path.
const IDS: [&str; 6] = ["doc0", "doc1", "notes?v=2", "plans/q1", "x#y", "50% off"];

fn id(n: u8) -> String {
    IDS[n as usize % IDS.len()].to_string()
}

/// A small id space so operations collide often.
fn arb_tab_ops() -> impl Strategy<Value = Vec<TabOp>> {
    prop::collection::vec(
        prop_oneof![
            3 => any::<u8>().prop_map(TabOp::Open),
            3 => any::<u8>().prop_map(TabOp::OpenBackground),
            2 => any::<u8>().prop_map(TabOp::Close),
            2 => any::<u8>().prop_map(TabOp::Activate),
            1 => Just(TabOp::ActivateDashboard),
            2 => Just(TabOp::Back),
            1 => Just(TabOp::Forward),
            1 => Just(TabOp::CloseAll),
        ],
        1..60,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tab_invariants_hold(ops in arb_tab_ops()) {
        let storage = MemoryStorage::new();
        let mut c = SessionController::new(storage.clone(), MemoryHistory::new("/"), Duration::from_secs(3));
        c.start(None);

        for op in &ops {
            let active_before = c.active_tab().clone();
            let history_before = c.history().length();
            match op {
                TabOp::Open(n) => c.open_and_activate(&id(*n), "t"),
                TabOp::OpenBackground(n) => {
                    c.open_in_background(&id(*n), "t");
                    prop_assert_eq!(c.active_tab(), &active_before, "background open changed active tab");
                }
                TabOp::Close(n) => c.close(&id(*n)),
                TabOp::Activate(n) => c.activate(TabId::document(id(*n))),
                TabOp::ActivateDashboard => c.activate(TabId::Dashboard),
                TabOp::Back => {
                    if let Some(location) = c.history_mut().back() {
                        c.on_popstate(&location);
                        prop_assert_eq!(c.history().length(), history_before, "popstate grew history");
                    }
                }
                TabOp::Forward => {
                    if let Some(location) = c.history_mut().forward() {
                        c.on_popstate(&location);
                        prop_assert_eq!(c.history().length(), history_before, "popstate grew history");
                    }
                }
                TabOp::CloseAll => {
                    c.close_all();
                    prop_assert!(c.active_tab().is_dashboard());
                    prop_assert_eq!(c.registry().tab_count(), 0);
                }
            }
            // Queued work is irrelevant to these invariants.
            c.take_effects();

            let ids = c.registry().tab_ids();
            let unique: HashSet<&String> = ids.iter().collect();
            prop_assert_eq!(unique.len(), ids.len(), "duplicate tab ids");

            if let Some(active) = c.active_tab().document_id() {
                prop_assert!(c.registry().contains(active), "active tab missing from registry");
            }
            prop_assert_eq!(c.location(), location_for(c.active_tab()));

            let snapshot = SessionManager::new(storage.clone())
                .restore_session()
                .unwrap()
                .unwrap();
            let saved: Vec<String> = snapshot.tabs.iter().map(|t| t.id.clone()).collect();
            prop_assert_eq!(saved, ids);
            prop_assert_eq!(&snapshot.active_tab_id, c.active_tab());
        }
    }

    #[test]
    fn reopening_after_reload_restores_same_tabs(ops in arb_tab_ops()) {
        let storage = MemoryStorage::new();
        let (ids, active) = {
            let mut c = SessionController::new(storage.clone(), MemoryHistory::new("/"), Duration::from_secs(3));
            c.start(None);
            for op in &ops {
                match op {
                    TabOp::Open(n) => c.open_and_activate(&id(*n), "t"),
                    TabOp::OpenBackground(n) => c.open_in_background(&id(*n), "t"),
                    TabOp::Close(n) => c.close(&id(*n)),
                    _ => {}
                }
            }
            (c.registry().tab_ids(), c.active_tab().clone())
        };

        let mut reloaded = SessionController::new(storage, MemoryHistory::new("/"), Duration::from_secs(3));
        reloaded.start(None);

        prop_assert_eq!(reloaded.registry().tab_ids(), ids);
        prop_assert_eq!(reloaded.active_tab(), &active);
        prop_assert_eq!(reloaded.history().length(), 1);
    }
}
