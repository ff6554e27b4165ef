//! Composes the three category results and page metadata into one report

use super::clock::{iso_timestamp, Clock};
use super::scoring::ScoreCalculator;
use crate::{AnalysisResult, Categories, CategoryResult, PageInfo, PageSnapshot};

pub struct Aggregator;

impl Aggregator {
    /// Build the full report. The overall score is the rounded mean of the
    /// three category scores; the timestamp comes from `clock`.
    pub fn compose(
        page: &PageSnapshot,
        accessibility: CategoryResult,
        seo: CategoryResult,
        performance: CategoryResult,
        clock: &dyn Clock,
    ) -> AnalysisResult {
        let score = ScoreCalculator::overall(accessibility.score, seo.score, performance.score);

        AnalysisResult {
            score,
            page_info: PageInfo {
                url: page.url().to_string(),
                title: page.title(),
                timestamp: iso_timestamp(clock.now()),
            },
            categories: Categories {
                accessibility,
                seo,
                performance,
            },
        }
    }
}
