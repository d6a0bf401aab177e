use std::sync::Arc;

use tracing::{debug, info};

use super::errors::ParseError;
use super::template::UrlTemplate;
use crate::common::client::Transport;

pub const DEFAULT_INITIAL_STEP: i64 = 100;

/// 自适应步长搜索的状态
///
/// `lower` 是已确认存在的最大编号，`upper` 是已确认不存在的最小编号。
/// 每次探测都落在 `(lower, upper)` 区间内，区间收缩到相邻时搜索结束。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceSearchState {
    pub probe: i64,
    pub step: i64,
    pub last_exists: bool,
    pub lower: i64,
    pub upper: Option<i64>,
}

impl SequenceSearchState {
    /// `start` 必须已经确认存在
    pub fn new(start: i64, initial_step: i64) -> Self {
        Self {
            probe: start,
            step: if initial_step == 0 { 1 } else { initial_step },
            last_exists: true,
            lower: start,
            upper: None,
        }
    }

    /// 边界已经夹住时返回 None
    pub fn next_candidate(&self) -> Option<i64> {
        let floor = self.lower.checked_add(1)?;
        if let Some(upper) = self.upper {
            if floor >= upper {
                return None;
            }
        }

        let mut candidate = self.probe.saturating_add(self.step).max(floor);
        if let Some(upper) = self.upper {
            candidate = candidate.min(upper - 1);
        }
        Some(candidate)
    }

    pub fn record(&mut self, candidate: i64, exists: bool) {
        self.probe = candidate;
        self.last_exists = exists;

        if exists {
            self.lower = self.lower.max(candidate);
            // 往回探测命中后，掉头向上并把步长减半
            if self.step < 0 {
                self.step = self.step.saturating_neg() / 2;
            }
            if self.step == 0 {
                self.step = 1;
            }
        } else {
            self.upper = Some(self.upper.map_or(candidate, |upper| upper.min(candidate)));
            // 向下取整，和负数步长的减半保持一致
            if self.step > 0 {
                self.step = self.step.saturating_neg().div_euclid(2);
            } else {
                self.step = self.step.div_euclid(2);
            }
            if self.step == 0 {
                self.step = -1;
            }
        }
    }

    /// 已确认存在的最大编号
    pub fn result(&self) -> i64 {
        self.lower
    }
}

/// 在不知道总数的情况下找出连续编号资源的最后一个编号
///
/// 探测严格串行，每一次都依赖上一次的结果。
pub struct SequenceDiscoverer {
    transport: Arc<dyn Transport>,
    max_probes: Option<usize>,
}

impl SequenceDiscoverer {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            max_probes: None,
        }
    }

    pub fn with_max_probes(mut self, max_probes: Option<usize>) -> Self {
        self.max_probes = max_probes;
        self
    }

    /// 返回最大的 N，使 `template(N)` 存在而 `template(N + 1)` 不存在
    ///
    /// 任何一次探测的网络错误都会中止搜索，不会被当成“不存在”。
    pub async fn find_upper_bound(
        &self,
        template: &UrlTemplate,
        start: u64,
        initial_step: i64,
    ) -> Result<u64, ParseError> {
        let start_number = i64::try_from(start).map_err(|_| ParseError::StartOutOfRange(start))?;

        let start_url = template.format(start);
        if !self.transport.exists(&start_url).await? {
            return Err(ParseError::StartNotFound(start_url));
        }

        let mut state = SequenceSearchState::new(start_number, initial_step);
        let mut probes = 0usize;

        while let Some(candidate) = state.next_candidate() {
            if let Some(limit) = self.max_probes {
                if probes >= limit {
                    return Err(ParseError::ProbeLimitExceeded(limit));
                }
            }
            probes += 1;

            // candidate 总是大于 lower >= 0
            let url = template.format(candidate as u64);
            let exists = self.transport.exists(&url).await?;
            debug!("探测编号 {} (步长 {}): {}", candidate, state.step, exists);
            state.record(candidate, exists);
        }

        let upper_bound = state.result() as u64;
        info!("找到最后一个编号: {} (共探测 {} 次)", upper_bound, probes);
        Ok(upper_bound)
    }
}
