use std::fmt::Write as _;

use crate::integrity::{INSIGHTS_MARKER, RESOURCE_LINKS_MARKER};
use crate::models::{PlanContext, Topic, TravelPreferences};

pub fn content_prompt(topic: Topic, prefs: &TravelPreferences) -> String {
    let destination = &prefs.destination;
    match topic {
        Topic::Sights => format!(
            "Please recommend notable attractions and sights to visit in {destination}."
        ),
        Topic::Food => format!(
            "Please recommend food, restaurants, and culinary experiences in {destination}."
        ),
        Topic::Lodging => format!(
            "Please recommend accommodation options in {destination} across different price points, suitable for a {} budget.",
            prefs.budget
        ),
        Topic::Insights => insights_query(destination),
        Topic::Images => images_query(destination),
        Topic::Synthesis => format!("Please create a travel plan for {destination}."),
    }
}

pub fn insights_query(destination: &str) -> String {
    format!("{destination} travel reviews traveler tips")
}

pub fn images_query(destination: &str) -> String {
    format!("{destination} landmarks cityscape travel photography")
}

/// Placeholder used when a content responder produced nothing usable.
pub fn unavailable_section(topic: Topic, destination: &str) -> String {
    let label = match topic {
        Topic::Sights => "attractions",
        Topic::Food => "food",
        Topic::Lodging => "accommodation",
        Topic::Insights => "insights",
        Topic::Images => "image",
        Topic::Synthesis => "itinerary",
    };
    format!("No {label} information available for {destination}.")
}

pub fn unavailable_itinerary(destination: &str) -> String {
    format!("No detailed itinerary could be generated for {destination}. Please try again.")
}

pub fn synthesis_prompt(plan: &PlanContext) -> String {
    let prefs = &plan.preferences;
    let interests = if prefs.interests.is_empty() {
        "Various activities".to_string()
    } else {
        prefs.interests.join(", ")
    };

    let mut prompt = format!(
        r#"Create a detailed day-by-day travel plan for a {days}-day trip to {destination}.

Travel preferences:
- Budget: {budget}
- Interests: {interests}

Use the following information to create a cohesive itinerary:

ATTRACTIONS AND SIGHTSEEING INFORMATION:
{sights}

FOOD AND DINING INFORMATION:
{food}

ACCOMMODATION INFORMATION:
{lodging}

For each day, provide:
1. Morning, afternoon, and evening activities
2. Recommended places to eat for each meal
3. Transportation suggestions between locations
4. Estimated costs where applicable

Create a logical flow for the itinerary that minimizes travel time and groups activities by geographic proximity.
"#,
        days = prefs.trip_length,
        destination = prefs.destination,
        budget = prefs.budget,
        sights = plan.sights,
        food = plan.food,
        lodging = plan.lodging,
    );

    if !plan.insights.trim().is_empty() {
        let _ = write!(
            prompt,
            r###"
IMPORTANT: After the itinerary, include a section titled "## {INSIGHTS_MARKER}" and copy the traveler insights below into it VERBATIM. Do not summarise, reorder or drop anything, and keep the "{RESOURCE_LINKS_MARKER}" list with every link exactly as given.

TRAVELER INSIGHTS TO PRESERVE:
{insights}
"###,
            insights = plan.insights,
        );
    }

    if !plan.images.is_empty() {
        let _ = write!(
            prompt,
            "\nIMPORTANT: Include every one of these image URLs VERBATIM in the plan as markdown images (![description](url)), placed next to the day or place they illustrate:\n"
        );
        for url in &plan.images {
            let _ = writeln!(prompt, "- {url}");
        }
    }

    prompt
}
