//! Counters for every place the app silently degrades, so operators can tell
//! when users are looking at fallback data.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    NotSaved,
    OptimisticSave,
    OptimisticUnsave,
    MockSavedList,
    MockDetails,
    TrendingUnavailable,
}

impl Fallback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Fallback::NotSaved => "not_saved",
            Fallback::OptimisticSave => "optimistic_save",
            Fallback::OptimisticUnsave => "optimistic_unsave",
            Fallback::MockSavedList => "mock_saved_list",
            Fallback::MockDetails => "mock_details",
            Fallback::TrendingUnavailable => "trending_unavailable",
        }
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    not_saved: AtomicU64,
    optimistic_save: AtomicU64,
    optimistic_unsave: AtomicU64,
    mock_saved_list: AtomicU64,
    mock_details: AtomicU64,
    trending_unavailable: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticsSnapshot {
    pub not_saved: u64,
    pub optimistic_save: u64,
    pub optimistic_unsave: u64,
    pub mock_saved_list: u64,
    pub mock_details: u64,
    pub trending_unavailable: u64,
}

impl Diagnostics {
    pub fn record(&self, fallback: Fallback) {
        self.counter(fallback).fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, fallback: Fallback) -> u64 {
        self.counter(fallback).load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            not_saved: self.count(Fallback::NotSaved),
            optimistic_save: self.count(Fallback::OptimisticSave),
            optimistic_unsave: self.count(Fallback::OptimisticUnsave),
            mock_saved_list: self.count(Fallback::MockSavedList),
            mock_details: self.count(Fallback::MockDetails),
            trending_unavailable: self.count(Fallback::TrendingUnavailable),
        }
    }

    fn counter(&self, fallback: Fallback) -> &AtomicU64 {
        match fallback {
            Fallback::NotSaved => &self.not_saved,
            Fallback::OptimisticSave => &self.optimistic_save,
            Fallback::OptimisticUnsave => &self.optimistic_unsave,
            Fallback::MockSavedList => &self.mock_saved_list,
            Fallback::MockDetails => &self.mock_details,
            Fallback::TrendingUnavailable => &self.trending_unavailable,
        }
    }
}
