//! Utility-class category rules.
//!
//! Variant prefixes (`md:`, `hover:`, `dark:`) are matched against the full
//! class; the remaining rules look only at the base utility after the last
//! `:` with any `!` important marker removed.

use regex::Regex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::error::AnalysisError;

/// Fixed category set, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternCategory
{
    Colors,
    Spacing,
    Sizing,
    Typography,
    Layout,
    FlexGrid,
    Borders,
    Effects,
    Responsive,
    StateVariant,
    DarkMode,
    ArbitraryValue,
}

impl PatternCategory
{
    pub const ALL: [PatternCategory; 12] = [
        PatternCategory::Colors,
        PatternCategory::Spacing,
        PatternCategory::Sizing,
        PatternCategory::Typography,
        PatternCategory::Layout,
        PatternCategory::FlexGrid,
        PatternCategory::Borders,
        PatternCategory::Effects,
        PatternCategory::Responsive,
        PatternCategory::StateVariant,
        PatternCategory::DarkMode,
        PatternCategory::ArbitraryValue,
    ];

    pub fn label(self) -> &'static str
    {
        match self
        {
            PatternCategory::Colors => "colors",
            PatternCategory::Spacing => "spacing",
            PatternCategory::Sizing => "sizing",
            PatternCategory::Typography => "typography",
            PatternCategory::Layout => "layout",
            PatternCategory::FlexGrid => "flex-grid",
            PatternCategory::Borders => "borders",
            PatternCategory::Effects => "effects",
            PatternCategory::Responsive => "responsive",
            PatternCategory::StateVariant => "state-variant",
            PatternCategory::DarkMode => "dark-mode",
            PatternCategory::ArbitraryValue => "arbitrary-value",
        }
    }

    /// Whether the rule applies to the full class rather than its base utility
    fn matches_full_class(self) -> bool
    {
        matches!(
            self,
            PatternCategory::Responsive | PatternCategory::StateVariant | PatternCategory::DarkMode
        )
    }

    fn rule(self) -> &'static str
    {
        match self
        {
            PatternCategory::Colors =>
            {
                r"^(?:bg|text|border|ring|fill|stroke|from|via|to|divide|outline|decoration|accent|caret|placeholder|shadow)-(?:inherit|current|transparent|black|white|(?:slate|gray|zinc|neutral|stone|red|orange|amber|yellow|lime|green|emerald|teal|cyan|sky|blue|indigo|violet|purple|fuchsia|pink|rose)-\d{2,3})(?:/\d+)?$"
            }
            PatternCategory::Spacing =>
            {
                r"^-?(?:p|px|py|pt|pr|pb|pl|ps|pe|m|mx|my|mt|mr|mb|ml|ms|me|gap|gap-x|gap-y|space-x|space-y)-(?:\d+(?:\.\d+)?|px|auto|\[[^\]]+\])$"
            }
            PatternCategory::Sizing =>
            {
                r"^(?:w|h|min-w|min-h|max-w|max-h|size)-(?:\d+(?:\.\d+)?|\d+/\d+|px|auto|full|screen|min|max|fit|xs|sm|md|lg|xl|\dxl|prose|\[[^\]]+\])$"
            }
            PatternCategory::Typography =>
            {
                r"^(?:text-(?:xs|sm|base|lg|xl|\dxl|left|center|right|justify)|font-(?:thin|extralight|light|normal|medium|semibold|bold|extrabold|black|sans|serif|mono)|leading-\S+|tracking-\S+|italic|not-italic|uppercase|lowercase|capitalize|normal-case|underline|line-through|no-underline|truncate)$"
            }
            PatternCategory::Layout =>
            {
                r"^(?:block|inline-block|inline|hidden|contents|table|static|fixed|absolute|relative|sticky|container|overflow-\S+|z-\S+|-?inset-\S+|-?top-\S+|-?right-\S+|-?bottom-\S+|-?left-\S+|float-\S+|clear-\S+|object-\S+)$"
            }
            PatternCategory::FlexGrid =>
            {
                r"^(?:flex|inline-flex|grid|inline-grid|flex-\S+|grow(?:-0)?|shrink(?:-0)?|basis-\S+|order-\S+|grid-cols-\S+|grid-rows-\S+|col-\S+|row-\S+|items-\S+|justify-\S+|content-\S+|self-\S+|place-\S+)$"
            }
            PatternCategory::Borders =>
            {
                r"^(?:border|border-(?:\d+|[xytrbl](?:-\d+)?|solid|dashed|dotted|double|none)|rounded(?:-\S+)?|ring(?:-\d+)?|divide-[xy](?:-\d+)?|outline(?:-(?:none|dashed|dotted|double|\d+))?)$"
            }
            PatternCategory::Effects =>
            {
                r"^(?:shadow(?:-(?:sm|md|lg|xl|2xl|inner|none))?|opacity-\d+|blur(?:-\S+)?|transition(?:-\S+)?|duration-\d+|ease-\S+|delay-\d+|animate-\S+|scale-\S+|-?rotate-\S+|-?translate-[xy]-\S+|cursor-\S+)$"
            }
            PatternCategory::Responsive => r"(?:^|:)(?:sm|md|lg|xl|2xl|max-sm|max-md|max-lg|max-xl):",
            PatternCategory::StateVariant =>
            {
                r"(?:^|:)(?:hover|focus|focus-within|focus-visible|active|visited|disabled|enabled|checked|required|invalid|first|last|odd|even|placeholder|group-hover|group-focus|peer-hover|peer-focus|peer-checked):"
            }
            PatternCategory::DarkMode => r"(?:^|:)dark:",
            PatternCategory::ArbitraryValue => r"\[[^\]]+\]",
        }
    }
}

impl std::fmt::Display for PatternCategory
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        f.write_str(self.label())
    }
}

/// Compiled category rules
pub struct PatternClassifier
{
    rules: Vec<(PatternCategory, Regex)>,
}

impl PatternClassifier
{
    pub fn new() -> Result<Self, AnalysisError>
    {
        let rules = PatternCategory::ALL
            .iter()
            .map(|&category| {
                Regex::new(category.rule())
                    .map(|re| (category, re))
                    .map_err(|cause| AnalysisError::Rule {
                        category: category
                            .label()
                            .to_string(),
                        cause,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    /// Every category `class` belongs to, in category order
    pub fn classify(
        &self,
        class: &str,
    ) -> SmallVec<[PatternCategory; 4]>
    {
        let base = base_utility(class);
        let mut out = SmallVec::new();

        for (category, re) in &self.rules
        {
            let subject = if category.matches_full_class() { class } else { base };
            if re.is_match(subject)
            {
                out.push(*category);
            }
        }

        out
    }
}

/// Utility part of a class: after the last variant separator, without `!`
pub fn base_utility(class: &str) -> &str
{
    // Arbitrary values may contain ':' (e.g. `bg-[url(a:b)]`), so only
    // split on separators outside brackets
    let mut depth = 0i32;
    let mut cut = 0;
    for (i, c) in class.char_indices()
    {
        match c
        {
            '[' => depth += 1,
            ']' => depth -= 1,
            ':' if depth == 0 => cut = i + 1,
            _ =>
            {}
        }
    }

    class[cut..].trim_start_matches('!')
}
