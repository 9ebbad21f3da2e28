/// 单批统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub success: usize,
    pub failed: usize,
}

impl BatchStats {
    pub fn total(&self) -> usize {
        self.success + self.failed
    }

    /// 按结果标签计数
    pub fn record(&mut self, success: bool) {
        if success {
            self.success += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// 整次运行的统计；`failed_batches` 决定输入文件是否移动
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
    pub batches: usize,
    /// 写入失败的批次编号（从 1 开始）
    pub failed_batches: Vec<usize>,
}

impl RunSummary {
    pub fn absorb(&mut self, batch: &BatchStats) {
        self.success += batch.success;
        self.errors += batch.failed;
        self.batches += 1;
    }

    /// 所有批次都已成功写入
    pub fn all_persisted(&self) -> bool {
        self.failed_batches.is_empty()
    }

    /// 成功率；没有记录时返回 `None`
    pub fn success_rate(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.success as f64 / self.total as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_guards_zero_total() {
        assert_eq!(RunSummary::default().success_rate(), None);

        let summary = RunSummary {
            total: 4,
            success: 3,
            errors: 1,
            batches: 1,
            failed_batches: Vec::new(),
        };
        assert_eq!(summary.success_rate(), Some(0.75));
        assert!(summary.all_persisted());
    }

    #[test]
    fn test_failed_batches_mark_run_incomplete() {
        let summary = RunSummary {
            failed_batches: vec![2],
            ..Default::default()
        };
        assert!(!summary.all_persisted());
    }
}
