pub(super) const IMAGE_PROMPT: &str = r#"Analyze this hostel complaint image and provide:
1. Category: electricity/water/maintenance/cleanliness/staff
2. Urgency: high (safety hazard/emergency/danger) or low (routine)
3. Problem description: What issue is visible in the image
4. Suggested repair steps: Brief repair recommendations
5. Location details: Any visible room/area identifiers (optional)

Reply with JSON only: {"category":"...","urgency":"...","problemDescription":"...","suggestedRepairSteps":"...","detectedLocation":"..."}"#;

pub(super) fn text_prompt(description: &str) -> String {
    format!(
        r#"Classify this hostel complaint into category and urgency.

Categories: electricity, water, maintenance, cleanliness, staff
Urgency: high (safety/danger/emergency/hazard/short circuit/naked wires/fire) or low (routine)

Complaint: "{description}"

Reply with JSON only: {{"category":"...","urgency":"..."}}"#
    )
}
