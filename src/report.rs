//! Terminal rendering of the interface state. Everything here is a pure
//! function of [`UiState`]; no I/O, no owned state.

use crate::analysis::AnalysisResult;
use crate::controller::{Status, UiState};
use std::fmt::Write as _;

const BAR_WIDTH: usize = 24;

/// Color band for the health-score badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthBand {
    Healthy,
    Moderate,
    Poor,
}

impl HealthBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 8.0 {
            HealthBand::Healthy
        } else if score >= 5.0 {
            HealthBand::Moderate
        } else {
            HealthBand::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HealthBand::Healthy => "健康",
            HealthBand::Moderate => "一般",
            HealthBand::Poor => "欠佳",
        }
    }
}

pub fn render(state: &UiState) -> String {
    match state.status {
        Status::Idle => render_idle(),
        Status::Analyzing => render_analyzing(state),
        Status::Error => render_error(state),
        Status::Success => render_success(state),
    }
}

fn render_idle() -> String {
    "上传食物照片\n请提供一张食物图片进行分析。支持 JPG, PNG 和 WebP。\n".to_string()
}

fn render_analyzing(state: &UiState) -> String {
    let mut out = String::new();
    push_preview(&mut out, state);
    out.push_str("正在分析美味...\n");
    out
}

fn render_error(state: &UiState) -> String {
    let mut out = String::new();
    push_preview(&mut out, state);
    out.push_str("分析失败\n");
    if let Some(message) = &state.error_message {
        let _ = writeln!(out, "{}", message);
    }
    out.push_str("[重试] 重新选择一张图片\n");
    out
}

fn render_success(state: &UiState) -> String {
    let mut out = String::new();
    push_preview(&mut out, state);
    if let Some(result) = &state.result {
        push_nutrition_card(&mut out, result);
    }
    out
}

fn push_preview(out: &mut String, state: &UiState) {
    if let Some(preview) = &state.preview_uri {
        // Data URIs run long; show only the head.
        let head: String = preview.chars().take(48).collect();
        let _ = writeln!(out, "图片: {}...", head);
        out.push('\n');
    }
}

fn push_nutrition_card(out: &mut String, result: &AnalysisResult) {
    let band = HealthBand::for_score(result.health_score);
    let _ = writeln!(
        out,
        "{}    健康评分 {}/10 [{}]",
        result.food_name, result.health_score, band.label()
    );
    let _ = writeln!(out, "{}", result.description);
    out.push('\n');

    let _ = writeln!(out, "总计 {} 千卡", result.total_calories);
    out.push('\n');

    let macros = &result.macros;
    let rows = [
        ("蛋白质", macros.protein),
        ("碳水  ", macros.carbs),
        ("脂肪  ", macros.fat),
        ("纤维  ", macros.fiber),
    ];
    let max = rows
        .iter()
        .map(|(_, grams)| *grams)
        .fold(0.0_f64, f64::max);
    for (label, grams) in rows {
        let _ = writeln!(out, "{} │{}│ {} 克", label, macro_bar(grams, max), grams);
    }
    out.push('\n');

    if !result.ingredients.is_empty() {
        out.push_str("详细成分\n");
        for ingredient in &result.ingredients {
            let _ = writeln!(out, "  {}  {} 千卡", ingredient.name, ingredient.calories);
        }
        out.push('\n');
    }

    if !result.health_tips.is_empty() {
        out.push_str("健康建议\n");
        for tip in &result.health_tips {
            let _ = writeln!(out, "  • {}", tip);
        }
    }
}

fn macro_bar(grams: f64, max: f64) -> String {
    let filled = if max > 0.0 {
        ((grams / max) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    let filled = filled.min(BAR_WIDTH);
    let mut bar = "█".repeat(filled);
    bar.push_str(&" ".repeat(BAR_WIDTH - filled));
    bar
}
