//! User-agent device classification.

use beacon_core::DeviceClass;

const TABLET_KEYWORDS: [&str; 4] = ["tablet", "ipad", "playbook", "silk"];

// "mobi" also covers "mobile", "iemobile", and "opera mobi".
const MOBILE_KEYWORDS: [&str; 9] = [
    "mobi",
    "android",
    "iphone",
    "ipod",
    "blackberry",
    "kindle",
    "webos",
    "hpwos",
    "opera mini",
];

/// Classify the requesting device from its user-agent string.
///
/// Matching is case-insensitive. The tablet check runs before the mobile
/// check, so an agent matching both (e.g. a Silk tablet build) classifies as
/// tablet. A blank agent string classifies as [`DeviceClass::Unknown`].
pub fn classify(user_agent: &str) -> DeviceClass {
    if user_agent.trim().is_empty() {
        return DeviceClass::Unknown;
    }
    let ua = user_agent.to_ascii_lowercase();
    if is_tablet(&ua) {
        DeviceClass::Tablet
    } else if is_mobile(&ua) {
        DeviceClass::Mobile
    } else {
        DeviceClass::Desktop
    }
}

fn is_tablet(ua: &str) -> bool {
    TABLET_KEYWORDS.iter().any(|k| ua.contains(k))
        || (ua.contains("android") && !ua.contains("mobi"))
}

fn is_mobile(ua: &str) -> bool {
    MOBILE_KEYWORDS.iter().any(|k| ua.contains(k))
}
