// ==========================================
// 抓取结果导入系统 - 合成 product_id 生成器
// ==========================================
// 红线: 每次调用返回新值，不跨运行复用
// ==========================================

use crate::importer::importer_trait::ProductIdGenerator;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// UUID v4 生成器（生产默认）
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidProductIdGenerator;

impl ProductIdGenerator for UuidProductIdGenerator {
    fn next_product_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// 顺序生成器: {prefix}-1, {prefix}-2, ...（测试用，结果可预测）
#[derive(Debug)]
pub struct SequentialProductIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialProductIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl ProductIdGenerator for SequentialProductIdGenerator {
    fn next_product_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", self.prefix, n)
    }
}
