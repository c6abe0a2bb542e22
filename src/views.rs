use chrono::NaiveDate;

use crate::role::Role;
use crate::structs::{parse_day, Booking, RoleId, Room};

pub fn format_date(raw: &str) -> String {
    if raw.trim().is_empty() {
        return "N/A".to_string();
    }
    match parse_day(raw) {
        Some(day) => day.format("%d/%m/%Y").to_string(),
        None => raw.to_string(),
    }
}

pub fn role_text(role: RoleId) -> String {
    format!("{} (ID: {})", Role::from(role).label(), role)
}

/// One check-in card as lines of text.
pub fn checkin_card(booking: &Booking, is_today: bool, is_processing: bool) -> Vec<String> {
    let mut lines = Vec::with_capacity(6);
    let badge = if is_today { "  [TODAY]" } else { "" };
    lines.push(format!("Booking #{}{}", booking.booking_id, badge));
    match booking.room_type_name() {
        Some(type_name) => lines.push(format!("  Room {} - {}", booking.room_id, type_name)),
        None => lines.push(format!("  Room {}", booking.room_id)),
    }
    lines.push(format!("  Guest: {}", booking.customer_name().unwrap_or("N/A")));
    lines.push(format!("  Check-in:  {}", format_date(&booking.checkin_date)));
    lines.push(format!("  Check-out: {}", format_date(&booking.checkout_date)));
    if is_processing {
        lines.push("  (check-in in progress)".to_string());
    } else {
        lines.push(format!("  Confirmed - ready: ci {}", booking.booking_id));
    }
    lines
}

pub fn show_checkin_cards(v: &[Booking], today: NaiveDate, is_processing: bool, searching: bool) {
    if v.is_empty() {
        println!("[INFO] NO BOOKINGS READY FOR CHECK-IN");
        if searching {
            println!("       no booking matches the search");
        } else {
            println!("       everything is checked in or not confirmed yet");
        }
        return;
    }
    for booking in v {
        for line in checkin_card(booking, booking.checks_in_on(today), is_processing) {
            println!("{}", line);
        }
    }
}

pub fn show_booking_info(v: &[Booking]) {
    if !v.is_empty() {
        println!("     id   room  status        check-in     check-out    guest");
        for b in v {
            println!(
                "{:>7} {:>6}  {:<12}  {:<11}  {:<11}  {}",
                b.booking_id,
                b.room_id,
                format!("{:?}", b.status_id),
                format_date(&b.checkin_date),
                format_date(&b.checkout_date),
                b.customer_name().unwrap_or("N/A")
            );
        }
    } else {
        println!("[INFO] BOOKING LIST NO DATA")
    }
}

pub fn show_room_info(v: &[Room]) {
    if !v.is_empty() {
        println!("     id  name          status  type");
        for r in v {
            println!(
                "{:>7}  {:<12}  {:>6}  {}",
                r.room_id,
                r.room_name.as_deref().unwrap_or("-"),
                r.status_id.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                r.room_type
                    .as_ref()
                    .and_then(|t| t.type_name.as_deref())
                    .unwrap_or("-")
            );
        }
    } else {
        println!("[INFO] ROOM LIST NO DATA")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{BookingStatus, Customer};

    #[test]
    fn empty_dates_read_na() {
        assert_eq!(format_date(""), "N/A");
        assert_eq!(format_date("2024-03-01"), "01/03/2024");
        assert_eq!(format_date("next week"), "next week");
    }

    #[test]
    fn card_shows_today_badge_and_guest() {
        let mut booking = Booking::new(12, 305, BookingStatus::Confirmed);
        booking.checkin_date = "2024-03-01".to_string();
        booking.customer = Some(Customer {
            customer_id: Some(9),
            customer_name: Some("Noy".to_string()),
        });
        let card = checkin_card(&booking, true, false);
        assert_eq!(card[0], "Booking #12  [TODAY]");
        assert_eq!(card[1], "  Room 305");
        assert_eq!(card[2], "  Guest: Noy");
        assert_eq!(card[4], "  Check-out: N/A");

        let busy = checkin_card(&booking, false, true);
        assert_eq!(busy[0], "Booking #12");
        assert_eq!(busy[5], "  (check-in in progress)");
    }

    #[test]
    fn role_text_names_the_role() {
        assert_eq!(role_text(2), "Receptionist (ID: 2)");
        assert_eq!(role_text(0), "Unknown (ID: 0)");
    }
}
