use crate::models::{DialogResponse, Intent, ScoredService};

pub const GREETING_REPLY: &str =
    "Xin chào! Tôi có thể giúp bạn về dịch vụ nha khoa, đặt lịch, hoặc báo giá. Bạn cần gì giúp đỡ?";
pub const CONTACT_REPLY: &str =
    "Thông tin liên hệ: Nha khoa Hoàng Bình - Số điện thoại: 0123-456-789 (ví dụ). Bạn có muốn chúng tôi gọi lại?";
pub const GOODBYE_REPLY: &str =
    "Cảm ơn bạn! Chúc bạn một ngày tốt lành. Nếu cần hỗ trợ thêm, hãy nhắn cho chúng tôi.";
pub const BOOKING_GENERIC_REPLY: &str =
    "Bạn muốn đặt lịch hẹn. Xin cung cấp tên, số điện thoại và thời gian mong muốn để chúng tôi hỗ trợ.";
pub const PRICE_UNSPECIFIED_REPLY: &str =
    "Bạn muốn biết giá. Vui lòng cho biết dịch vụ cụ thể hoặc mô tả triệu chứng để tôi hỗ trợ chính xác hơn.";
pub const INQUIRY_EMPTY_REPLY: &str =
    "Mình chưa tìm thấy dịch vụ phù hợp. Bạn có thể mô tả rõ hơn triệu chứng hoặc mong muốn không?";
pub const FALLBACK_REPLY: &str =
    "Xin lỗi, mình chưa hiểu. Bạn có thể mô tả lại hoặc hỏi về dịch vụ/giá/đặt lịch không?";
pub const PRICE_ON_REQUEST: &str = "Liên hệ để biết giá";
pub const CURRENCY: &str = "VND";

/// Builds the user-facing reply. Pure: ranking happens upstream.
pub fn compose_reply(
    intent: Intent,
    confidence: f32,
    keywords: &[String],
    suggestions: &[ScoredService],
    raw_message: &str,
) -> DialogResponse {
    let reply = match intent {
        Intent::Greeting => GREETING_REPLY.to_string(),
        Intent::BookAppointment if suggestions.is_empty() => BOOKING_GENERIC_REPLY.to_string(),
        Intent::BookAppointment => format!(
            "Bạn muốn đặt lịch cho dịch vụ: {}. Vui lòng cho biết tên, số điện thoại, và ngày giờ mong muốn.",
            joined_names(suggestions)
        ),
        Intent::AskPrice if suggestions.is_empty() => PRICE_UNSPECIFIED_REPLY.to_string(),
        Intent::AskPrice => {
            let lines = suggestions
                .iter()
                .map(|s| {
                    let price = s
                        .service
                        .price
                        .map(format_price)
                        .unwrap_or_else(|| PRICE_ON_REQUEST.to_string());
                    format!("- {}: {}", s.service.name, price)
                })
                .collect::<Vec<_>>();
            format!("Giá tham khảo cho các dịch vụ:\n{}", lines.join("\n"))
        }
        Intent::ServiceInquiry if suggestions.is_empty() => INQUIRY_EMPTY_REPLY.to_string(),
        Intent::ServiceInquiry => {
            let lines = suggestions
                .iter()
                .map(|s| {
                    format!(
                        "- {} (độ phù hợp {:.2}): {}",
                        s.service.name, s.score, s.service.description
                    )
                })
                .collect::<Vec<_>>();
            format!(
                "Mình tìm thấy các dịch vụ phù hợp:\n{}\nBạn muốn biết thêm thông tin hay đặt lịch?",
                lines.join("\n")
            )
        }
        Intent::Contact => CONTACT_REPLY.to_string(),
        Intent::Goodbye => GOODBYE_REPLY.to_string(),
        Intent::Unknown if suggestions.is_empty() => FALLBACK_REPLY.to_string(),
        Intent::Unknown => format!(
            "Mình không rõ lắm nhưng có thể bạn đang quan tâm tới các dịch vụ sau: {}. Bạn muốn biết thêm về dịch vụ nào?",
            joined_names(suggestions)
        ),
    };

    DialogResponse {
        query: raw_message.to_string(),
        intent,
        confidence,
        entities: keywords.to_vec(),
        suggestions: suggestions.to_vec(),
        reply,
    }
}

/// Whole currency units with comma thousands separators, e.g. `1,500,000 VND`.
/// Non-finite prices render as the contact-for-price note.
pub fn format_price(price: f64) -> String {
    if !price.is_finite() {
        return PRICE_ON_REQUEST.to_string();
    }

    let units = price.trunc();
    let digits = format!("{:.0}", units.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if units < 0.0 { "-" } else { "" };
    format!("{sign}{grouped} {CURRENCY}")
}

fn joined_names(suggestions: &[ScoredService]) -> String {
    suggestions
        .iter()
        .map(|s| s.service.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
