use crate::api::attendance::{CheckAccepted, CheckPayload, HistoryDay, HistoryQuery};
use crate::api::duty::{
    DutyDetail, DutyListResponse, DutyMemberView, DutyQuery, DutySummary, MemberRejectBody,
};
use crate::api::employee::{EmployeeListResponse, EmployeeQuery};
use crate::api::request::{CreateRequest, RejectBody, RequestFilter, RequestListResponse};
use crate::api::schedule::{CreateHoliday, HolidayQuery, UpdateScheduleDay};
use crate::api::site::{CreateSite, SiteListResponse, SiteQuery, UpdateSite};
use crate::api::stats::{DutyStatsQuery, RequestStatsQuery};
use crate::domain::stats::{DutyStats, RequestStats};
use crate::model::attendance::{Attendance, RawStatus};
use crate::model::duty::{DutyAssignment, DutyKind, DutyMember, DutySubStatus};
use crate::model::employee::Employee;
use crate::model::request::{Request, RequestKind};
use crate::model::schedule::{Holiday, ScheduleDay};
use crate::model::site::{Site, SiteKind};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Presensi System API",
        version = "1.0.0",
        description = r#"
## Presensi: GPS-verified attendance & leave management

This API powers an employee attendance system with geofenced check-in/out
and an administrative approval workflow.

### 🔹 Key Features
- **Attendance**
  - GPS-verified daily check-in and check-out against registered sites
  - Day-by-day history with holiday/weekend-aware status classification
- **Requests (Pengajuan)**
  - Leave, overtime and duty-travel applications with approve/reject
- **Duty Travel (Dinas)**
  - Assignment-scoped check-in sites and per-employee attendance validation
- **Dashboards**
  - Pending/approved/rejected and validation counters

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Administrative operations require the **Admin** role.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints
- Precondition failures carry a stable `error` code

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today,
        crate::api::attendance::history,

        crate::api::site::create_site,
        crate::api::site::list_sites,
        crate::api::site::get_site,
        crate::api::site::update_site,

        crate::api::schedule::get_schedule,
        crate::api::schedule::update_schedule,
        crate::api::schedule::list_holidays,
        crate::api::schedule::create_holiday,

        crate::api::request::create_request,
        crate::api::request::request_list,
        crate::api::request::get_request,
        crate::api::request::approve_request,
        crate::api::request::reject_request,

        crate::api::duty::duty_list,
        crate::api::duty::duty_detail,
        crate::api::duty::approve_member,
        crate::api::duty::reject_member,

        crate::api::stats::request_counters,
        crate::api::stats::duty_counters,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee
    ),
    components(
        schemas(
            CheckPayload,
            CheckAccepted,
            HistoryDay,
            HistoryQuery,
            Attendance,
            RawStatus,
            Site,
            SiteKind,
            CreateSite,
            UpdateSite,
            SiteQuery,
            SiteListResponse,
            ScheduleDay,
            Holiday,
            UpdateScheduleDay,
            CreateHoliday,
            HolidayQuery,
            Request,
            RequestKind,
            CreateRequest,
            RejectBody,
            RequestFilter,
            RequestListResponse,
            DutyAssignment,
            DutyKind,
            DutyMember,
            DutySubStatus,
            DutyQuery,
            DutySummary,
            DutyDetail,
            DutyMemberView,
            DutyListResponse,
            MemberRejectBody,
            RequestStats,
            DutyStats,
            RequestStatsQuery,
            DutyStatsQuery,
            Employee,
            EmployeeQuery,
            EmployeeListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Geofenced check-in/out and classified history"),
        (name = "Site", description = "Registered location management"),
        (name = "Schedule", description = "Work schedule and holiday calendar"),
        (name = "Request", description = "Leave/overtime/travel applications"),
        (name = "Duty", description = "Duty-travel assignments and validation"),
        (name = "Stats", description = "Dashboard counters"),
        (name = "Employee", description = "Employee register"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
