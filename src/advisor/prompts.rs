use crate::analysis::reviews::ReviewInsights;
use crate::analysis::tally::Tally;
use crate::analysis::trends::OperatingSummary;

/// How many pain points the review prompt quotes
const PROMPT_CONS: usize = 3;

/// Prompt asking for three improvements based on the review analysis
pub fn review_prompt(insights: &ReviewInsights) -> String {
    let audience = insights.main_audience().unwrap_or("未知");
    let cons = format_tallies(&insights.top_cons[..insights.top_cons.len().min(PROMPT_CONS)]);
    format!("根據評價數據：客群主要是{}，最大缺點是{}。請給出3點改善建議。", audience, cons)
}

/// Prompt for the operations consultant, anchored to the current month
pub fn operations_prompt(summary: &OperatingSummary, month: u32) -> String {
    let data = format!(
        "近{}天營收總和: {:.0}, 平均住房率: {:.2}",
        summary.days, summary.revenue_total, summary.mean_occupancy
    );

    format!(
        "角色設定：你是一位精通「金門觀光市場」的資深經營顧問，具備敏銳的市場嗅覺。

現況背景：
- 現在時間是：{month} 月 (請結合金門此時的氣候特性、霧季風險、或節慶活動來分析)。
- 店家經營數據：{data}。

任務目標：
請不需要客套，直接給出 3 點經營策略，必須包含：
1. 【外部機會/威脅】：結合現在的月份(例如霧季、暑假、連假、東北季風)，預測接下來人流變化。
2. 【庫存與備貨】：根據上述預測，針對早餐食材或備品提出建議。
3. 【行銷亮點】：針對這個季節的遊客痛點(例如太冷、怕沒飛機)，提出一個暖心服務建議。

請用繁體中文，條列式回答。"
    )
}

fn format_tallies(tallies: &[Tally]) -> String {
    if tallies.is_empty() {
        return "無明顯缺點".to_string();
    }
    tallies
        .iter()
        .map(|t| format!("{}({}次)", t.label, t.count))
        .collect::<Vec<_>>()
        .join("、")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(label: &str, count: usize) -> Tally {
        Tally { label: label.to_string(), count }
    }

    #[test]
    fn review_prompt_quotes_top_three_cons() {
        let insights = ReviewInsights {
            review_count: 10,
            companion_mix: vec![tally("家庭", 6), tally("情侶", 4)],
            top_pros: vec![],
            top_cons: vec![tally("隔音差", 4), tally("停車不便", 3), tally("蚊子多", 2), tally("早餐少", 1)],
        };
        let prompt = review_prompt(&insights);
        assert!(prompt.contains("客群主要是家庭"));
        assert!(prompt.contains("隔音差(4次)、停車不便(3次)、蚊子多(2次)"));
        assert!(!prompt.contains("早餐少"));
    }

    #[test]
    fn review_prompt_without_data() {
        let insights = ReviewInsights {
            review_count: 0,
            companion_mix: vec![],
            top_pros: vec![],
            top_cons: vec![],
        };
        let prompt = review_prompt(&insights);
        assert!(prompt.contains("未知") && prompt.contains("無明顯缺點"));
    }

    #[test]
    fn operations_prompt_embeds_month_and_summary() {
        let summary = OperatingSummary {
            days: 30,
            revenue_total: 154300.0,
            mean_occupancy: 0.5166,
        };
        let prompt = operations_prompt(&summary, 12);
        assert!(prompt.contains("現在時間是：12 月"));
        assert!(prompt.contains("近30天營收總和: 154300, 平均住房率: 0.52"));
    }
}
