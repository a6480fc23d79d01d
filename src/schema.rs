//! Diesel table definitions matching the bootstrap DDL in
//! `db::bootstrap`. Kept by hand since the schema is created lazily by the
//! application rather than by migrations.

diesel::table! {
    users (id) {
        id -> Integer,
        user_id -> BigInt,
        first_name -> Nullable<Text>,
        last_name -> Nullable<Text>,
        username -> Nullable<Text>,
        registration_date -> Date,
    }
}

diesel::table! {
    user_settings (id) {
        id -> Integer,
        user_id -> BigInt,
        news -> Bool,
        marketplace -> Bool,
        rights -> Text,
        use_bot -> Bool,
    }
}

diesel::table! {
    user_statistics (id) {
        id -> Integer,
        user_id -> BigInt,
        today -> Integer,
        month -> Integer,
        all_time -> Integer,
    }
}

diesel::table! {
    function_statistics (id) {
        id -> Integer,
        name -> Text,
        today -> Integer,
        month -> Integer,
        all_time -> Integer,
    }
}

diesel::table! {
    duty_schedule (id) {
        id -> Integer,
        first_date -> Date,
        last_date -> Date,
        assignee -> Text,
    }
}

diesel::table! {
    checkpoints (id) {
        id -> Integer,
        last_checkpoint -> Nullable<Text>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, user_settings, user_statistics);
