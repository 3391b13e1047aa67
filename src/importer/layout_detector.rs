// ==========================================
// 抓取结果导入系统 - 工作表格式识别
// ==========================================
// 职责: 仅根据列名集合判定格式（不看行内容）
// 优先级: ShoppingGrid → ProductStandard → ProductPositionNoLink → Unrecognized
// 红线: ShoppingGrid 必须最先判定，其列可能碰巧满足后续较弱条件
// ==========================================

use crate::domain::{Layout, Sheet};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

// Product<N>_Title / Product<N>_Link
static RE_GRID_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Product\d+_(Title|Link)$").expect("valid grid column regex"));

/// 识别工作表格式
pub fn detect_layout(sheet: &Sheet) -> Layout {
    let layout = detect_layout_from_columns(sheet.columns.as_slice());
    debug!(sheet = %sheet.name, layout = %layout, "工作表格式识别完成");
    layout
}

/// 根据列名识别格式
pub fn detect_layout_from_columns<S: AsRef<str>>(columns: &[S]) -> Layout {
    let has = |name: &str| columns.iter().any(|c| c.as_ref() == name);

    if columns.iter().any(|c| is_grid_column(c.as_ref())) {
        return Layout::ShoppingGrid;
    }

    if has("id") && has("title") && has("link") {
        return Layout::ProductStandard;
    }

    if has("position") && has("title") && has("id") && !has("link") {
        return Layout::ProductPositionNoLink;
    }

    Layout::Unrecognized
}

/// 是否为购物网格的商品列
pub fn is_grid_column(column: &str) -> bool {
    RE_GRID_COLUMN.is_match(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_shopping_grid() {
        let columns = ["Date", "Query", "Product1_Title", "Product1_Link"];
        assert_eq!(detect_layout_from_columns(&columns), Layout::ShoppingGrid);
        // 只有 Link 也算
        assert_eq!(detect_layout_from_columns(&["Product12_Link"]), Layout::ShoppingGrid);
    }

    #[test]
    fn test_grid_wins_over_product_columns() {
        let columns = ["id", "title", "link", "Product1_Title"];
        assert_eq!(detect_layout_from_columns(&columns), Layout::ShoppingGrid);
    }

    #[test]
    fn test_detect_product_standard() {
        let columns = ["position", "id", "title", "link", "price"];
        assert_eq!(detect_layout_from_columns(&columns), Layout::ProductStandard);
    }

    #[test]
    fn test_detect_position_no_link() {
        let columns = ["position", "title", "id", "rating"];
        assert_eq!(detect_layout_from_columns(&columns), Layout::ProductPositionNoLink);
    }

    #[test]
    fn test_detect_unrecognized() {
        assert_eq!(detect_layout_from_columns(&["foo", "bar"]), Layout::Unrecognized);
        // 缺 position 且缺 link
        assert_eq!(detect_layout_from_columns(&["id", "title"]), Layout::Unrecognized);
        // 前缀相似但不符合 Product<N>_ 模式
        assert_eq!(
            detect_layout_from_columns(&["ProductX_Title", "Product1_Price"]),
            Layout::Unrecognized
        );
    }

    #[test]
    fn test_detect_layout_uses_sheet_columns_without_rows() {
        let sheet = Sheet::new("shoes", ["id", "title", "link"]);
        assert_eq!(detect_layout(&sheet), Layout::ProductStandard);
    }
}
