//! A working subset of the common dialect.
//!
//! Fields are listed in XML declaration order; the codec derives the
//! wire order. CRC_EXTRA seeds are the standard ones, so frames built
//! here interoperate with stock autopilots and ground stations.

use crate::protocol::PrimitiveType::*;
use crate::protocol::{Dialect, FieldDefinition, MessageDefinition};

/// Telemetry, parameter, and command messages most links exchange.
pub fn common() -> Dialect {
    Dialect::builder("common")
        .message(heartbeat(), 50)
        .message(sys_status(), 124)
        .message(system_time(), 137)
        .message(ping(), 237)
        .message(param_request_read(), 214)
        .message(param_request_list(), 159)
        .message(param_value(), 220)
        .message(param_set(), 168)
        .message(gps_raw_int(), 24)
        .message(attitude(), 39)
        .message(global_position_int(), 104)
        .message(manual_control(), 243)
        .message(rc_channels_override(), 124)
        .message(command_long(), 152)
        .message(autopilot_version(), 178)
        .message(statustext(), 83)
        .message(protocol_version(), 217)
        .build()
}

fn heartbeat() -> MessageDefinition {
    MessageDefinition::new(
        0,
        "HEARTBEAT",
        vec![
            FieldDefinition::scalar("type", UInt8),
            FieldDefinition::scalar("autopilot", UInt8),
            FieldDefinition::scalar("base_mode", UInt8),
            FieldDefinition::scalar("custom_mode", UInt32),
            FieldDefinition::scalar("system_status", UInt8),
            FieldDefinition::scalar("mavlink_version", UInt8),
        ],
    )
}

fn sys_status() -> MessageDefinition {
    MessageDefinition::new(
        1,
        "SYS_STATUS",
        vec![
            FieldDefinition::scalar("onboard_control_sensors_present", UInt32),
            FieldDefinition::scalar("onboard_control_sensors_enabled", UInt32),
            FieldDefinition::scalar("onboard_control_sensors_health", UInt32),
            FieldDefinition::scalar("load", UInt16),
            FieldDefinition::scalar("voltage_battery", UInt16),
            FieldDefinition::scalar("current_battery", Int16),
            FieldDefinition::scalar("battery_remaining", Int8),
            FieldDefinition::scalar("drop_rate_comm", UInt16),
            FieldDefinition::scalar("errors_comm", UInt16),
            FieldDefinition::scalar("errors_count1", UInt16),
            FieldDefinition::scalar("errors_count2", UInt16),
            FieldDefinition::scalar("errors_count3", UInt16),
            FieldDefinition::scalar("errors_count4", UInt16),
            FieldDefinition::scalar("onboard_control_sensors_present_extended", UInt32)
                .extension(),
            FieldDefinition::scalar("onboard_control_sensors_enabled_extended", UInt32)
                .extension(),
            FieldDefinition::scalar("onboard_control_sensors_health_extended", UInt32)
                .extension(),
        ],
    )
}

fn system_time() -> MessageDefinition {
    MessageDefinition::new(
        2,
        "SYSTEM_TIME",
        vec![
            FieldDefinition::scalar("time_unix_usec", UInt64),
            FieldDefinition::scalar("time_boot_ms", UInt32),
        ],
    )
}

fn ping() -> MessageDefinition {
    MessageDefinition::new(
        4,
        "PING",
        vec![
            FieldDefinition::scalar("time_usec", UInt64),
            FieldDefinition::scalar("seq", UInt32),
            FieldDefinition::scalar("target_system", UInt8),
            FieldDefinition::scalar("target_component", UInt8),
        ],
    )
}

fn param_request_read() -> MessageDefinition {
    MessageDefinition::new(
        20,
        "PARAM_REQUEST_READ",
        vec![
            FieldDefinition::scalar("target_system", UInt8),
            FieldDefinition::scalar("target_component", UInt8),
            FieldDefinition::array("param_id", Char, 16),
            FieldDefinition::scalar("param_index", Int16),
        ],
    )
}

fn param_request_list() -> MessageDefinition {
    MessageDefinition::new(
        21,
        "PARAM_REQUEST_LIST",
        vec![
            FieldDefinition::scalar("target_system", UInt8),
            FieldDefinition::scalar("target_component", UInt8),
        ],
    )
}

fn param_value() -> MessageDefinition {
    MessageDefinition::new(
        22,
        "PARAM_VALUE",
        vec![
            FieldDefinition::array("param_id", Char, 16),
            FieldDefinition::scalar("param_value", Float),
            FieldDefinition::scalar("param_type", UInt8),
            FieldDefinition::scalar("param_count", UInt16),
            FieldDefinition::scalar("param_index", UInt16),
        ],
    )
}

fn param_set() -> MessageDefinition {
    MessageDefinition::new(
        23,
        "PARAM_SET",
        vec![
            FieldDefinition::scalar("target_system", UInt8),
            FieldDefinition::scalar("target_component", UInt8),
            FieldDefinition::array("param_id", Char, 16),
            FieldDefinition::scalar("param_value", Float),
            FieldDefinition::scalar("param_type", UInt8),
        ],
    )
}

fn gps_raw_int() -> MessageDefinition {
    MessageDefinition::new(
        24,
        "GPS_RAW_INT",
        vec![
            FieldDefinition::scalar("time_usec", UInt64),
            FieldDefinition::scalar("fix_type", UInt8),
            FieldDefinition::scalar("lat", Int32),
            FieldDefinition::scalar("lon", Int32),
            FieldDefinition::scalar("alt", Int32),
            FieldDefinition::scalar("eph", UInt16),
            FieldDefinition::scalar("epv", UInt16),
            FieldDefinition::scalar("vel", UInt16),
            FieldDefinition::scalar("cog", UInt16),
            FieldDefinition::scalar("satellites_visible", UInt8),
            FieldDefinition::scalar("alt_ellipsoid", Int32).extension(),
            FieldDefinition::scalar("h_acc", UInt32).extension(),
            FieldDefinition::scalar("v_acc", UInt32).extension(),
            FieldDefinition::scalar("vel_acc", UInt32).extension(),
            FieldDefinition::scalar("hdg_acc", UInt32).extension(),
            FieldDefinition::scalar("yaw", UInt16).extension(),
        ],
    )
}

fn attitude() -> MessageDefinition {
    MessageDefinition::new(
        30,
        "ATTITUDE",
        vec![
            FieldDefinition::scalar("time_boot_ms", UInt32),
            FieldDefinition::scalar("roll", Float),
            FieldDefinition::scalar("pitch", Float),
            FieldDefinition::scalar("yaw", Float),
            FieldDefinition::scalar("rollspeed", Float),
            FieldDefinition::scalar("pitchspeed", Float),
            FieldDefinition::scalar("yawspeed", Float),
        ],
    )
}

fn global_position_int() -> MessageDefinition {
    MessageDefinition::new(
        33,
        "GLOBAL_POSITION_INT",
        vec![
            FieldDefinition::scalar("time_boot_ms", UInt32),
            FieldDefinition::scalar("lat", Int32),
            FieldDefinition::scalar("lon", Int32),
            FieldDefinition::scalar("alt", Int32),
            FieldDefinition::scalar("relative_alt", Int32),
            FieldDefinition::scalar("vx", Int16),
            FieldDefinition::scalar("vy", Int16),
            FieldDefinition::scalar("vz", Int16),
            FieldDefinition::scalar("hdg", UInt16),
        ],
    )
}

fn manual_control() -> MessageDefinition {
    MessageDefinition::new(
        69,
        "MANUAL_CONTROL",
        vec![
            FieldDefinition::scalar("target", UInt8),
            FieldDefinition::scalar("x", Int16),
            FieldDefinition::scalar("y", Int16),
            FieldDefinition::scalar("z", Int16),
            FieldDefinition::scalar("r", Int16),
            FieldDefinition::scalar("buttons", UInt16),
            FieldDefinition::scalar("buttons2", UInt16).extension(),
            FieldDefinition::scalar("enabled_extensions", UInt8).extension(),
            FieldDefinition::scalar("s", Int16).extension(),
            FieldDefinition::scalar("t", Int16).extension(),
            FieldDefinition::scalar("aux1", Int16).extension(),
            FieldDefinition::scalar("aux2", Int16).extension(),
            FieldDefinition::scalar("aux3", Int16).extension(),
            FieldDefinition::scalar("aux4", Int16).extension(),
            FieldDefinition::scalar("aux5", Int16).extension(),
            FieldDefinition::scalar("aux6", Int16).extension(),
        ],
    )
}

fn rc_channels_override() -> MessageDefinition {
    MessageDefinition::new(
        70,
        "RC_CHANNELS_OVERRIDE",
        vec![
            FieldDefinition::scalar("target_system", UInt8),
            FieldDefinition::scalar("target_component", UInt8),
            FieldDefinition::scalar("chan1_raw", UInt16),
            FieldDefinition::scalar("chan2_raw", UInt16),
            FieldDefinition::scalar("chan3_raw", UInt16),
            FieldDefinition::scalar("chan4_raw", UInt16),
            FieldDefinition::scalar("chan5_raw", UInt16),
            FieldDefinition::scalar("chan6_raw", UInt16),
            FieldDefinition::scalar("chan7_raw", UInt16),
            FieldDefinition::scalar("chan8_raw", UInt16),
            FieldDefinition::scalar("chan9_raw", UInt16).extension(),
            FieldDefinition::scalar("chan10_raw", UInt16).extension(),
            FieldDefinition::scalar("chan11_raw", UInt16).extension(),
            FieldDefinition::scalar("chan12_raw", UInt16).extension(),
            FieldDefinition::scalar("chan13_raw", UInt16).extension(),
            FieldDefinition::scalar("chan14_raw", UInt16).extension(),
            FieldDefinition::scalar("chan15_raw", UInt16).extension(),
            FieldDefinition::scalar("chan16_raw", UInt16).extension(),
            FieldDefinition::scalar("chan17_raw", UInt16).extension(),
            FieldDefinition::scalar("chan18_raw", UInt16).extension(),
        ],
    )
}

fn command_long() -> MessageDefinition {
    MessageDefinition::new(
        76,
        "COMMAND_LONG",
        vec![
            FieldDefinition::scalar("target_system", UInt8),
            FieldDefinition::scalar("target_component", UInt8),
            FieldDefinition::scalar("command", UInt16),
            FieldDefinition::scalar("confirmation", UInt8),
            FieldDefinition::scalar("param1", Float),
            FieldDefinition::scalar("param2", Float),
            FieldDefinition::scalar("param3", Float),
            FieldDefinition::scalar("param4", Float),
            FieldDefinition::scalar("param5", Float),
            FieldDefinition::scalar("param6", Float),
            FieldDefinition::scalar("param7", Float),
        ],
    )
}

fn autopilot_version() -> MessageDefinition {
    MessageDefinition::new(
        148,
        "AUTOPILOT_VERSION",
        vec![
            FieldDefinition::scalar("capabilities", UInt64),
            FieldDefinition::scalar("flight_sw_version", UInt32),
            FieldDefinition::scalar("middleware_sw_version", UInt32),
            FieldDefinition::scalar("os_sw_version", UInt32),
            FieldDefinition::scalar("board_version", UInt32),
            FieldDefinition::array("flight_custom_version", UInt8, 8),
            FieldDefinition::array("middleware_custom_version", UInt8, 8),
            FieldDefinition::array("os_custom_version", UInt8, 8),
            FieldDefinition::scalar("vendor_id", UInt16),
            FieldDefinition::scalar("product_id", UInt16),
            FieldDefinition::scalar("uid", UInt64),
            FieldDefinition::array("uid2", UInt8, 18).extension(),
        ],
    )
}

fn statustext() -> MessageDefinition {
    MessageDefinition::new(
        253,
        "STATUSTEXT",
        vec![
            FieldDefinition::scalar("severity", UInt8),
            FieldDefinition::array("text", Char, 50),
            FieldDefinition::scalar("id", UInt16).extension(),
            FieldDefinition::scalar("chunk_seq", UInt8).extension(),
        ],
    )
}

fn protocol_version() -> MessageDefinition {
    MessageDefinition::new(
        300,
        "PROTOCOL_VERSION",
        vec![
            FieldDefinition::scalar("version", UInt16),
            FieldDefinition::scalar("min_version", UInt16),
            FieldDefinition::scalar("max_version", UInt16),
            FieldDefinition::array("spec_version_hash", UInt8, 8),
            FieldDefinition::array("library_version_hash", UInt8, 8),
        ],
    )
}
