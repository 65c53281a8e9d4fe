//! Agenda views: the immediate-focus list, weekly stats and free slots.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::Serialize;

use crate::models::{Appointment, AppointmentStatus};

/// Size of the focus list on the dashboard.
pub const DEFAULT_FOCUS_LIMIT: usize = 8;

/// Ranking used by the focus list; lower comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusRank {
    Overdue = 1,
    Today = 2,
    Priority = 3,
    Upcoming = 4,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusItem {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub is_overdue: bool,
    pub is_today: bool,
    pub is_priority: bool,
    pub rank: FocusRank,
}

impl FocusItem {
    fn new(appointment: &Appointment, now: NaiveDateTime) -> Self {
        let is_overdue = appointment.scheduled_at() < now;
        let is_today = appointment.date == now.date();
        let is_priority = appointment.priority.is_some_and(|p| p.is_high());
        let rank = if is_overdue {
            FocusRank::Overdue
        } else if is_today {
            FocusRank::Today
        } else if is_priority {
            FocusRank::Priority
        } else {
            FocusRank::Upcoming
        };
        Self {
            appointment: appointment.clone(),
            is_overdue,
            is_today,
            is_priority,
            rank,
        }
    }
}

/// Pending appointments ranked overdue, today, high priority, upcoming; ties
/// by scheduled date and time.
pub fn immediate_focus(appointments: &[Appointment], now: NaiveDateTime, limit: usize) -> Vec<FocusItem> {
    let mut items: Vec<FocusItem> = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Pending)
        .map(|a| FocusItem::new(a, now))
        .collect();
    items.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| a.appointment.scheduled_at().cmp(&b.appointment.scheduled_at()))
    });
    items.truncate(limit);
    items
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WeeklyStats {
    pub total: usize,
    pub done: usize,
    pub cancelled: usize,
    pub pending: usize,
    /// Done over total, as a rounded percentage.
    pub attendance_rate: u32,
}

/// Sunday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Stats over the Sunday-to-Saturday week containing `today`.
pub fn weekly_stats(appointments: &[Appointment], today: NaiveDate) -> WeeklyStats {
    let start = week_start(today);
    let end = start + Duration::days(6);
    let mut stats = appointments
        .iter()
        .filter(|a| a.date >= start && a.date <= end)
        .fold(WeeklyStats::default(), |mut s, a| {
            s.total += 1;
            match a.status {
                AppointmentStatus::Done => s.done += 1,
                AppointmentStatus::Cancelled => s.cancelled += 1,
                AppointmentStatus::Pending => s.pending += 1,
            }
            s
        });
    if stats.total > 0 {
        stats.attendance_rate = (stats.done as f64 / stats.total as f64 * 100.0).round() as u32;
    }
    stats
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Morning,
    Afternoon,
}

impl DayPeriod {
    fn bounds(&self) -> (NaiveTime, NaiveTime) {
        let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap_or(NaiveTime::MIN);
        match self {
            Self::Morning => (at(6), at(12)),
            Self::Afternoon => (at(13), at(18)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleGap {
    pub period: DayPeriod,
    pub date: NaiveDate,
    pub description: String,
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "domingo",
        Weekday::Mon => "segunda-feira",
        Weekday::Tue => "terça-feira",
        Weekday::Wed => "quarta-feira",
        Weekday::Thu => "quinta-feira",
        Weekday::Fri => "sexta-feira",
        Weekday::Sat => "sábado",
    }
}

/// Mornings (6h-12h) and afternoons (13h-18h) of the next seven days with no
/// pending appointment.
pub fn schedule_gaps(appointments: &[Appointment], today: NaiveDate) -> Vec<ScheduleGap> {
    let mut gaps = Vec::new();
    for offset in 0..7 {
        let date = today + Duration::days(offset);
        for period in [DayPeriod::Morning, DayPeriod::Afternoon] {
            let (from, to) = period.bounds();
            let busy = appointments.iter().any(|a| {
                a.status == AppointmentStatus::Pending
                    && a.date == date
                    && a.time >= from
                    && a.time <= to
            });
            if busy {
                continue;
            }
            let day = weekday_name(date.weekday());
            let description = match period {
                DayPeriod::Morning => format!("Manhã livre na {}. Hora de prospectar?", day),
                DayPeriod::Afternoon => format!("Tarde livre na {}. Que tal visitas?", day),
            };
            gaps.push(ScheduleGap {
                period,
                date,
                description,
            });
        }
    }
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentInput, Priority};

    fn appt(date: NaiveDate, hour: u32, status: AppointmentStatus, priority: Option<Priority>) -> Appointment {
        AppointmentInput {
            client_id: None,
            policy_id: None,
            title: format!("{} {}h", date, hour),
            date,
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            status,
            priority,
            notes: None,
        }
        .into_appointment()
    }

    #[test]
    fn test_focus_ranking() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let now = today.and_hms_opt(10, 0, 0).unwrap();
        let list = vec![
            appt(today + Duration::days(3), 9, AppointmentStatus::Pending, None),
            appt(today + Duration::days(5), 9, AppointmentStatus::Pending, Some(Priority::Urgent)),
            appt(today, 15, AppointmentStatus::Pending, None),
            appt(today - Duration::days(1), 9, AppointmentStatus::Pending, None),
            appt(today, 8, AppointmentStatus::Done, None),
        ];
        let focus = immediate_focus(&list, now, DEFAULT_FOCUS_LIMIT);
        let ranks: Vec<FocusRank> = focus.iter().map(|f| f.rank).collect();
        assert_eq!(
            ranks,
            vec![FocusRank::Overdue, FocusRank::Today, FocusRank::Priority, FocusRank::Upcoming]
        );
        assert_eq!(immediate_focus(&list, now, 2).len(), 2);
    }

    #[test]
    fn test_weekly_stats_rounds_attendance() {
        // Wednesday; the week runs Sunday 9 to Saturday 15
        let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let list = vec![
            appt(NaiveDate::from_ymd_opt(2024, 6, 9).unwrap(), 9, AppointmentStatus::Done, None),
            appt(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(), 9, AppointmentStatus::Done, None),
            appt(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(), 9, AppointmentStatus::Cancelled, None),
            appt(NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(), 9, AppointmentStatus::Done, None),
        ];
        let stats = weekly_stats(&list, today);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.done, 2);
        assert_eq!(stats.attendance_rate, 67);
        assert_eq!(weekly_stats(&[], today).attendance_rate, 0);
    }

    #[test]
    fn test_schedule_gaps() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let list = vec![appt(today, 9, AppointmentStatus::Pending, None)];
        let gaps = schedule_gaps(&list, today);
        assert_eq!(gaps.len(), 13);
        assert_eq!(gaps[0].period, DayPeriod::Afternoon);
        assert_eq!(gaps[0].description, "Tarde livre na quarta-feira. Que tal visitas?");
    }
}
