//! Deltas for the HR and payroll schema, in the order they were written.

use super::{AddColumns, Delta, EvolutionLog, ExistenceGuard};
use crate::error::Result;
use crate::types::{ColumnSpec, ColumnType, DefaultValue};

pub const ATTENDANCE_STATUSES: &[&str] = &["present", "absent", "half_day", "leave"];

const URL: ColumnType = ColumnType::String(255);
const DAYS: ColumnType = ColumnType::Decimal {
    precision: 10,
    scale: 2,
};

pub fn deltas() -> Result<Vec<Box<dyn Delta>>> {
    let deltas: Vec<AddColumns> = vec![
        AddColumns::new("20250402104512-add-photo-url-to-staff-profiles", "staff_profiles")?
            .column(ColumnSpec::new("photo_url", URL).comment("Profile photo location")),
        AddColumns::new("20250410093015-add-status-to-attendance", "attendance")?.column(
            ColumnSpec::new(
                "status",
                ColumnType::Enum {
                    length: 20,
                    values: ATTENDANCE_STATUSES,
                },
            )
            .default_value(DefaultValue::Null)
            .comment("Attendance status for the day"),
        ),
        AddColumns::new("20250415121040-add-geolocation-to-attendance", "attendance")?
            .column(
                ColumnSpec::new(
                    "lat",
                    ColumnType::Decimal {
                        precision: 10,
                        scale: 8,
                    },
                )
                .comment("Punch latitude"),
            )
            .column(
                ColumnSpec::new(
                    "lng",
                    ColumnType::Decimal {
                        precision: 11,
                        scale: 8,
                    },
                )
                .after("lat")
                .comment("Punch longitude"),
            ),
        // Date-only identifier; sorts as midnight.
        AddColumns::new("20250420-add-auto-punchout-field", "attendance")?.column(
            ColumnSpec::new("autoPunchout", ColumnType::Boolean)
                .not_null()
                .default_value(DefaultValue::Bool(false))
                .comment("Set when the system punched the staff member out"),
        ),
        AddColumns::new("20250420154500-add-salary-values-to-users", "users")?.column(
            ColumnSpec::new("salary_values", ColumnType::Json)
                .after("salary_template_id")
                .comment("Component values for the assigned salary template"),
        ),
        AddColumns::new(
            "20250502110233-add-punch-window-to-shift-templates",
            "shift_templates",
        )?
        .column(
            ColumnSpec::new("earliest_punch_in_time", ColumnType::Time)
                .comment("Earliest time a punch in is accepted"),
        )
        .column(
            ColumnSpec::new("latest_punch_out_time", ColumnType::Time)
                .after("earliest_punch_in_time")
                .comment("Latest time a punch out is accepted"),
        ),
        AddColumns::new(
            "20250509083010-add-paid-unpaid-days-to-leave-requests",
            "leave_requests",
        )?
        .column(ColumnSpec::new("paid_days", DAYS))
        .column(ColumnSpec::new("unpaid_days", DAYS).after("paid_days")),
        AddColumns::new(
            "20250512141122-add-logo-url-to-org-business-info",
            "org_business_info",
        )?
        .column(ColumnSpec::new("logo_url", URL).comment("Organization logo location")),
        AddColumns::new("20250520100000-add-max-geolocation-staff", "subscriptions")?.column(
            ColumnSpec::new("max_geolocation_staff", ColumnType::Integer)
                .default_value(DefaultValue::Integer(0))
                .comment("Staff allowed to punch with geolocation"),
        ),
        AddColumns::new("20250520100500-add-staff-limit-to-subscriptions", "subscriptions")?
            .column(
                ColumnSpec::new("staff_limit", ColumnType::Integer)
                    .comment("Maximum number of staff profiles"),
            ),
        AddColumns::new("20250603093000-add-note-to-attendance", "attendance")?
            .column(ColumnSpec::new("note", ColumnType::Text)),
        AddColumns::new("20250603094500-add-total-work-hours-to-attendance", "attendance")?
            .column(
                ColumnSpec::new(
                    "total_work_hours",
                    ColumnType::Decimal {
                        precision: 5,
                        scale: 2,
                    },
                )
                .after("note"),
            ),
        AddColumns::new("20250611120000-add-payslip-path-to-payroll-lines", "payroll_lines")?
            .column(ColumnSpec::new("payslip_path", URL).comment("Generated payslip file")),
        // Some environments received this column by hand before the delta existed.
        AddColumns::new("20250618160000-add-active-to-clients", "clients")?
            .column(
                ColumnSpec::new("active", ColumnType::Boolean)
                    .default_value(DefaultValue::Bool(true)),
            )
            .guard(ExistenceGuard::SkipIfPresent),
    ];

    Ok(deltas
        .into_iter()
        .map(|d| Box::new(d) as Box<dyn Delta>)
        .collect())
}

/// The complete log for this schema.
pub fn evolution_log() -> Result<EvolutionLog> {
    EvolutionLog::new(deltas()?)
}
