// Text rendering of the fleet table
use crate::application::fleet_binder::FleetView;
use crate::domain::connection::ConnectionState;
use crate::domain::row::RowState;

const HEADER: [&str; 8] = ["DEVICE", "STATUS", "VALVE", "NOW", "PREV", "DELTA", "TIME", "VIEW"];

pub fn render_fleet(view: &FleetView, connection: ConnectionState) -> String {
    let mut out = format!("Droplets · as of {}", view.as_of().unwrap_or("-"));
    if let Some(age) = view.cache_age_ms() {
        out.push_str(&format!(" (cache {} ms)", age));
    }
    out.push_str(&format!(" · {}\n", connection));
    if let Some(err) = view.cache_error() {
        out.push_str(&format!("server cache error: {}\n", err));
    }

    let lines = std::iter::once(format_line(HEADER.map(str::to_string)))
        .chain(view.rows().iter().map(|row| format_line(row_cells(row))));
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn row_cells(row: &RowState) -> [String; 8] {
    let now = if row.pressure_alarm {
        format!("{}!", row.pressure_now)
    } else {
        row.pressure_now.clone()
    };
    let view = if row.link.enabled {
        format!("{} {}", row.link.label(), row.link.href)
    } else {
        row.link.label().to_string()
    };

    [
        row.device_id.clone(),
        row.connectivity.clone(),
        row.valve.clone(),
        now,
        row.pressure_prev.clone(),
        row.delta.clone(),
        row.time.clone(),
        view,
    ]
}

fn format_line(cells: [String; 8]) -> String {
    let [id, status, valve, now, prev, delta, time, view] = cells;
    format!(
        "{:<16} {:<8} {:<8} {:<9} {:<9} {:<9} {:<19} {}",
        id, status, valve, now, prev, delta, time, view
    )
    .trim_end()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fleet_binder::FleetViewBinder;
    use crate::domain::snapshot::FleetSnapshot;

    #[test]
    fn test_render_fleet() {
        let mut binder = FleetViewBinder::new();
        binder.apply(
            &FleetSnapshot::from_json(
                r#"{"server_time_utc":"12:00:00Z","devices":[
                    {"device_id":"b2","pressure_now":4.999,"pressure_prev":4.5,"valve_state":"OPEN","has_view":true},
                    {"device_id":"a1","offline":true,"pressure_now":7.2}]}"#,
            )
            .unwrap(),
        );

        let text = render_fleet(binder.view(), ConnectionState::Connected);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Droplets · as of 12:00:00Z · connected");
        assert!(lines[1].starts_with("DEVICE"));
        assert!(lines[2].starts_with("a1"));
        assert!(lines[2].contains("Offline"));
        assert!(lines[2].contains("7.200!"));
        assert!(lines[2].ends_with("No init"));
        assert!(lines[3].starts_with("b2"));
        assert!(lines[3].contains("4.999 "));
        assert!(lines[3].ends_with("Open /device/b2"));
    }

    #[test]
    fn test_render_empty_view() {
        let text = render_fleet(&FleetView::default(), ConnectionState::Reconnecting);
        assert_eq!(text.lines().next(), Some("Droplets · as of - · reconnecting…"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_render_cache_indicators() {
        let mut binder = FleetViewBinder::new();
        binder.apply(
            &FleetSnapshot::from_json(
                r#"{"server_time_utc":"12:00:00Z","cache_age_ms":900,"cache_error":"influx down","devices":[]}"#,
            )
            .unwrap(),
        );

        let text = render_fleet(binder.view(), ConnectionState::Connected);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Droplets · as of 12:00:00Z (cache 900 ms) · connected");
        assert_eq!(lines[1], "server cache error: influx down");
        assert!(lines[2].starts_with("DEVICE"));
        assert!(text.ends_with('\n'));
    }
}
