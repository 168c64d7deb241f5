//! Canned structured answers used whenever the remote service cannot.
//!
//! Selection is a pure function of the lowercased query text, so the
//! conversation never dead-ends on a bare error: any failure upstream
//! resolves to one of these fixed responses.

use crate::chat::{RelatedItem, RelatedKind, Section, StructuredResponse};

/// Pick the canned response for a query. Keyword checks run in fixed
/// priority order: fleet/transport first, then insurance, else the generic
/// company overview. A query matching both domains resolves to fleet.
pub fn select(query: &str) -> StructuredResponse {
    let q = query.to_lowercase();

    if q.contains("fleet") || q.contains("transport") {
        fleet_response()
    } else if q.contains("insurance") {
        insurance_response()
    } else {
        generic_response()
    }
}

fn section(content: &str) -> Section {
    Section {
        content: content.to_string(),
    }
}

fn related(title: &str, kind: RelatedKind, image: &str, url: &str) -> RelatedItem {
    RelatedItem {
        title: title.to_string(),
        kind,
        image: image.to_string(),
        url: url.to_string(),
    }
}

fn generic_response() -> StructuredResponse {
    StructuredResponse {
        intro: "Binary Semantics offers a comprehensive global portfolio of products, platforms, frameworks and solutions spanning industries including technology, insurance, automotive, and retail. These offerings combine software innovation, cloud strategy, and data intelligence to enable enterprises to achieve scalability and digital transformation globally.".to_string(),
        sections: vec![
            section("The <span class='font-bold text-gray-900'>Products and Platforms</span> portfolio delivers a robust mix of proprietary software and an expansive partnership ecosystem. It supports enterprise-grade <span class='font-bold text-gray-900'>AI automation, digital commerce</span> and <span class='font-bold text-gray-900'>data management</span> products backed by ROI-focused offerings."),
            section("Across <span class='font-bold text-gray-900'>financial services</span>, our Intelligent Insurance Automation suite combines <span class='font-bold text-gray-900'>microservices architecture</span> and <span class='font-bold text-gray-900'>AI-driven analytics</span> for seamless policy lifecycle management and claims processing."),
            section("In <span class='font-bold text-gray-900'>Fleet & Logistics</span>, our Smart Fleet Management ecosystem brings together <span class='font-bold text-gray-900'>IoT hardware, real-time telematics</span> and <span class='font-bold text-gray-900'>predictive maintenance</span> frameworks for accelerated operational efficiency."),
        ],
        related: vec![
            related(
                "Intelligent Insurance Automation Suite",
                RelatedKind::LearnMore,
                "https://images.unsplash.com/photo-1454165804606-c3d57bc86b40?q=80&w=400&auto=format&fit=crop",
                "https://www.binarysemantics.com/industries/insurance",
            ),
            related(
                "Binary Semantics and Google Cloud Partnership",
                RelatedKind::CaseStudy,
                "https://images.unsplash.com/photo-1573164713988-8665fc963095?q=80&w=400&auto=format&fit=crop",
                "https://www.binarysemantics.com/case-studies",
            ),
            related(
                "Smart Fleet Management Solutions Brochure",
                RelatedKind::DownloadBrochure,
                "https://images.unsplash.com/photo-1519389950473-47ba0277781c?q=80&w=400&auto=format&fit=crop",
                "https://www.binarysemantics.com/products/fleetrobo",
            ),
        ],
        suggestions: vec![
            "What are Binary Semantics' flagship software and platforms?".to_string(),
            "Which industries do the digital and cloud services target?".to_string(),
            "How does the Fleet Management solution optimize costs?".to_string(),
        ],
    }
}

fn fleet_response() -> StructuredResponse {
    let mut response = generic_response();
    response.intro = "Our Smart Fleet Management ecosystem is designed to revolutionize logistics. By leveraging IoT-enabled telematics and real-time data analytics, we provide complete visibility into fleet performance, ensuring safety, compliance, and cost efficiency.".to_string();
    response.sections = vec![
        section("Real-time <span class='font-bold text-gray-900'>Vehicle Tracking</span> and route optimization to minimize fuel consumption and delivery delays."),
        section("<span class='font-bold text-gray-900'>Predictive Maintenance</span> alerts that prevent costly breakdowns by analyzing engine health data."),
        section("Comprehensive <span class='font-bold text-gray-900'>Driver Behavior Analysis</span> to improve safety standards and reduce insurance premiums."),
    ];
    response.related[0] = related(
        "Fleet Telematics Dashboard Demo",
        RelatedKind::LearnMore,
        "https://images.unsplash.com/photo-1592861956120-e524fc739696?q=80&w=400",
        "https://www.binarysemantics.com/products/fleetrobo",
    );
    response.suggestions = vec![
        "How does the driver behavior scoring work?".to_string(),
        "Can this integrate with existing ERP systems?".to_string(),
        "What hardware is required for tracking?".to_string(),
    ];
    response
}

fn insurance_response() -> StructuredResponse {
    let mut response = generic_response();
    response.intro = "Binary Semantics empowers the insurance sector with Intelligent Insurance Automation. We streamline the entire policy lifecycle—from risk assessment to claims processing—using Generative AI and Machine Learning to reduce operational costs by up to 30%.".to_string();
    response.sections = vec![
        section("<span class='font-bold text-gray-900'>Automated Underwriting</span> engine that assesses risk in real-time using alternative data sources."),
        section("AI-driven <span class='font-bold text-gray-900'>Claims Processing</span> that reduces turnaround time from days to minutes."),
        section("Hyper-personalized <span class='font-bold text-gray-900'>Customer Engagement</span> tools powered by conversational AI."),
    ];
    response.related[0] = related(
        "AI in Insurance: A Whitepaper",
        RelatedKind::DownloadBrochure,
        "https://images.unsplash.com/photo-1507679799987-c73779587ccf?q=80&w=400",
        "https://www.binarysemantics.com/industries/insurance",
    );
    response.suggestions = vec![
        "How does the fraud detection system work?".to_string(),
        "Is the platform compliant with GDPR?".to_string(),
        "Can I see a demo of the claims module?".to_string(),
    ];
    response
}
