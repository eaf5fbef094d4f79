//! Catalog of the pre-rendered historical charts.

/// One chart image.
#[derive(Debug)]
pub struct Chart {
    pub title: &'static str,
    pub image: &'static str,
    pub description: &'static str,
}

/// A group of charts shown under one heading.
#[derive(Debug)]
pub struct ChartSection {
    pub id: &'static str,
    pub title: &'static str,
    pub charts: &'static [Chart],
}

/// A dashboard filter tab.
#[derive(Debug)]
pub struct ChartCategory {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
}

/// Filter id that shows every section.
pub const ALL_CATEGORIES: &str = "all";

pub const CATEGORIES: &[ChartCategory] = &[
    ChartCategory { id: ALL_CATEGORIES, name: "All Analysis", icon: "📊" },
    ChartCategory { id: "trends", name: "Trends", icon: "📈" },
    ChartCategory { id: "causes", name: "Root Causes", icon: "🔍" },
    ChartCategory { id: "geography", name: "Geography", icon: "🌍" },
    ChartCategory { id: "devices", name: "Devices", icon: "🏥" },
    ChartCategory { id: "keywords", name: "Keywords", icon: "🔤" },
];

pub const SECTIONS: &[ChartSection] = &[
    ChartSection {
        id: "trends",
        title: "Recall Trends",
        charts: &[
            Chart {
                title: "Monthly Recall Trends",
                image: "/images/Processed/recalls_trend_monthly_improved.png",
                description: "Analysis of recall patterns over months",
            },
            Chart {
                title: "Yearly Recall Trends",
                image: "/images/Processed/recalls_trend_yearly.png",
                description: "Year-over-year recall analysis",
            },
        ],
    },
    ChartSection {
        id: "causes",
        title: "Root Causes",
        charts: &[Chart {
            title: "Root Cause Distribution",
            image: "/images/Processed/root_cause_pie_processed.png",
            description: "Breakdown of primary causes for device recalls",
        }],
    },
    ChartSection {
        id: "geography",
        title: "Geographic Analysis",
        charts: &[Chart {
            title: "Top Countries by Recalls",
            image: "/images/Processed/top_countries.png",
            description: "Countries with highest recall incidents",
        }],
    },
    ChartSection {
        id: "devices",
        title: "Device Analysis",
        charts: &[
            Chart {
                title: "Device Categories",
                image: "/images/Processed/top_device_categories.png",
                description: "Most affected device categories",
            },
            Chart {
                title: "Top Manufacturers",
                image: "/images/Processed/top_manufacturers.png",
                description: "Manufacturers with highest recall rates",
            },
        ],
    },
    ChartSection {
        id: "keywords",
        title: "Keyword Analysis",
        charts: &[Chart {
            title: "Top Keywords",
            image: "/images/Processed/top_keywords.png",
            description: "Most frequently mentioned keywords in recalls",
        }],
    },
];

/// Sections matching a filter. Unknown filters match nothing.
pub fn sections_for(category: &str) -> Vec<&'static ChartSection> {
    SECTIONS
        .iter()
        .filter(|s| category == ALL_CATEGORIES || s.id == category)
        .collect()
}
