//! Canned keyword replies used when the assistant backend is unreachable.

/// Starter questions shown under an empty conversation
pub const SUGGESTED_QUESTIONS: [&str; 6] = [
    "Find me a luxury hotel in Paris",
    "What are the best beach destinations?",
    "I need a hotel near Times Square",
    "Recommend hotels for families",
    "What's the best time to visit Tokyo?",
    "Show me budget-friendly options",
];

/// Prefix placed before a canned reply after a backend failure
pub const APOLOGY: &str = "Sorry, I couldn't reach the assistant just now.";

/// Checked in order; the first group with a matching keyword wins.
const KEYWORD_REPLIES: &[(&[&str], &str)] = &[
    (
        &["paris", "france"],
        "I'd recommend the Grand Luxe Palace in Paris! It has a 95% AI match score for you based on your preferences. It's located in Downtown Paris with stunning Eiffel Tower views, rated 4.8 stars, and starting at $350/night. Would you like to see more options in Paris or book this hotel?",
    ),
    (
        &["beach", "tropical"],
        "For beach destinations, I highly recommend the Maldives! The Oceanfront Resort & Spa is perfect with its private beach, infinity pool, and water sports facilities. It has a 92% AI match score and costs $450/night. Other great beach options include resorts in Bali and the Caribbean. Which interests you more?",
    ),
    (
        &["budget", "cheap", "affordable"],
        "I can help you find great budget-friendly options! Based on your search, I found several hotels under $200/night with excellent ratings. The Tokyo Skyline Hotel at $280/night offers great value with modern amenities and a perfect location. Would you like to see more budget options or filter by specific price range?",
    ),
    (
        &["family", "kids", "children"],
        "For family travel, I recommend hotels with family-friendly amenities like kids clubs, pools, and spacious rooms. The Dubai Marina Towers is excellent for families with a dedicated kids club, multiple pools, and family suites starting at $400/night. Would you like recommendations in a specific destination?",
    ),
    (
        &["business", "work"],
        "For business travel, I suggest Manhattan Heights in New York. It's in Midtown Manhattan with easy access to business districts, features a business center, high-speed WiFi, and work desks in all rooms. Starting at $320/night with a 90% AI match for business travelers. Need hotels in other business destinations?",
    ),
    (
        &["tokyo", "japan"],
        "Tokyo is amazing! The best time to visit is during spring (March-May) for cherry blossoms or fall (September-November) for pleasant weather. The Tokyo Skyline Hotel in Shibuya is a great choice at $280/night with a 88% AI match. It's modern, centrally located, and perfect for exploring the city. Want to know more about Tokyo attractions?",
    ),
    (
        &["mountain", "ski"],
        "For mountain destinations, I highly recommend the Alpine Retreat in Zermatt, Switzerland! It offers ski-in/ski-out access, stunning Matterhorn views, and luxury spa facilities. Starting at $480/night with a 91% AI match for adventure travelers. It's perfect for both winter skiing and summer hiking. Interested in booking?",
    ),
];

const DEFAULT_REPLY: &str = "I'd be happy to help you find the perfect hotel! Could you tell me more about what you're looking for? For example: your destination, travel dates, budget, and what amenities are important to you. Or you can browse our AI-recommended hotels that match your preferences!";

/// Pick the canned reply for a user message
///
/// Matching is a case-insensitive substring test.
pub fn canned_reply(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    KEYWORD_REPLIES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, reply)| *reply)
        .unwrap_or(DEFAULT_REPLY)
}
