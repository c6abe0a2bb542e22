use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Local;
use once_cell::sync::OnceCell;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;
use tracing_subscriber::EnvFilter;

use frontdesk::config::DEFAULT_CONFIG_PATH;
use frontdesk::role::{auth_snapshot, resolve_role, RoleSources};
use frontdesk::room_actions::Notification;
use frontdesk::storage::{FileStorage, KeyValueStorage, AUTH_STORAGE_KEY, SESSION_USER_KEY};
use frontdesk::structs::{BookingId, BookingInput, RoleId, RoomId};
use frontdesk::{
    views, BookingStore, CheckinStore, FrontDeskConfig, HttpBookingService, RoomActions,
    RoomService, StoreContext,
};

struct Desk {
    config: Mutex<FrontDeskConfig>,
    config_path: String,
    service: Arc<HttpBookingService>,
    ctx: StoreContext,
    bookings: BookingStore<HttpBookingService>,
    checkins: CheckinStore<HttpBookingService>,
    session_storage: FileStorage,
    local_storage: FileStorage,
}

impl Desk {
    fn new(config: FrontDeskConfig, config_path: String) -> Result<Self, Box<dyn Error>> {
        let service = Arc::new(HttpBookingService::new(&config)?);
        let ctx = StoreContext::new();
        Ok(Desk {
            bookings: BookingStore::new(service.clone(), ctx.clone()),
            checkins: CheckinStore::new(service.clone(), ctx.clone()),
            session_storage: FileStorage::new(&config.session_storage_dir),
            local_storage: FileStorage::new(&config.local_storage_dir),
            service,
            ctx,
            config: Mutex::new(config),
            config_path,
        })
    }

    fn desk_role(&self) -> Option<RoleId> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner).role_id
    }

    /// Remember the desk role in the config file so the next start keeps it.
    fn persist_role(&self, role: Option<RoleId>) -> Result<(), Box<dyn Error>> {
        let mut config = self.config.lock().unwrap_or_else(PoisonError::into_inner);
        config.role_id = role;
        config.write_toml(&self.config_path)?;
        info!("desk role {:?} written to {}", role, self.config_path);
        Ok(())
    }

    fn role_sources(&self) -> RoleSources<'static> {
        RoleSources::gather(self.desk_role(), None, &self.session_storage, &self.local_storage)
    }

    fn print_error(&self) {
        if let Some(err) = self.ctx.errors.error() {
            println!("[ERROR] {}", err);
            self.ctx.errors.clear_error();
        }
    }
}

static GLOBAL_DESK: OnceCell<Desk> = OnceCell::new();

fn parse_id(arg: Option<&&str>) -> Option<i64> {
    arg.and_then(|s| s.parse().ok())
}

async fn ask(lines: &mut Lines<BufReader<Stdin>>, question: &str) -> Result<bool, Box<dyn Error>> {
    println!("{} [y/N]", question);
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn checkin_flow(
    desk: &Desk,
    lines: &mut Lines<BufReader<Stdin>>,
    id: BookingId,
) -> Result<(), Box<dyn Error>> {
    let booking = match desk.checkins.confirmed_bookings().into_iter().find(|b| b.booking_id == id) {
        Some(booking) => booking,
        None => {
            println!("[INFO] booking {} is not waiting for check-in", id);
            return Ok(());
        }
    };
    desk.checkins.set_selected_booking(Some(booking.clone()));
    for line in views::checkin_card(&booking, booking.checks_in_on(Local::now().date_naive()), false) {
        println!("{}", line);
    }
    if !ask(lines, "Check this guest in?").await? {
        desk.checkins.set_selected_booking(None);
        return Ok(());
    }
    if desk.checkins.process_checkin(id).await.is_ok() {
        println!("[OK] booking {} checked in", id);
    }
    desk.print_error();
    Ok(())
}

async fn delete_room_flow(
    desk: &Desk,
    lines: &mut Lines<BufReader<Stdin>>,
    id: RoomId,
) -> Result<(), Box<dyn Error>> {
    let rooms = desk.service.get_rooms().await?;
    let room = match rooms.into_iter().find(|r| r.room_id == id) {
        Some(room) => room,
        None => {
            println!("[INFO] no room {}", id);
            return Ok(());
        }
    };
    let mut actions = RoomActions::new(desk.service.clone(), room, &desk.role_sources());
    if let Err(e) = actions.request_delete() {
        println!("[ERROR] {}", e);
        return Ok(());
    }
    let notification = if ask(lines, &format!("Delete room {}? This cannot be undone.", id)).await? {
        actions.confirm_delete().await?
    } else {
        actions.cancel_delete()
    };
    println!("{}", notification);
    Ok(())
}

async fn run_command(
    desk: &Desk,
    lines: &mut Lines<BufReader<Stdin>>,
    commands: &[&str],
) -> Result<bool, Box<dyn Error>> {
    match commands[0] {
        "help" => println!(r##"
    [{}]
    help        : print this help message
    exit        : exit the program
    ls          : fetch and print all bookings
    ci          : print bookings ready for check-in (search applied)
    today       : print today's check-ins
    s [text]    : set check-in search (empty clears)
    in <id>     : check a guest in
    cf <id>     : confirm booking
    cx <id>     : cancel booking
    del <id>    : delete booking
    new <room> <customer> <in> <out> : create booking
    rooms       : print rooms
    rm <roomId> : delete room (manager only)
    role        : print current role
    login <n>   : remember role n for this desk
    logout      : forget the remembered role
    r           : force refresh confirmed bookings
    "##, Local::now().to_rfc3339()),
        "exit" => {
            println!("Bye!");
            return Ok(false);
        }
        "ls" => {
            desk.bookings.fetch_items().await;
            views::show_booking_info(&desk.bookings.items());
            desk.print_error();
        }
        "ci" => {
            let searching = !desk.checkins.search_value().is_empty();
            views::show_checkin_cards(
                &desk.checkins.get_filtered_bookings(),
                Local::now().date_naive(),
                desk.checkins.is_processing(),
                searching,
            );
        }
        "today" => {
            let today = desk.checkins.get_today_check_ins();
            println!("{} check-in(s) today", today.len());
            views::show_checkin_cards(&today, Local::now().date_naive(), false, false);
        }
        "s" => {
            desk.checkins.set_search_value(&commands[1..].join(" "));
            println!(
                "{} confirmed, {} matching",
                desk.checkins.confirmed_bookings().len(),
                desk.checkins.get_filtered_bookings().len()
            );
        }
        "in" => match parse_id(commands.get(1)) {
            Some(id) => checkin_flow(desk, lines, id).await?,
            None => println!("usage: in <bookingId>"),
        },
        "cf" | "cx" | "del" => {
            let id = match parse_id(commands.get(1)) {
                Some(id) => id,
                None => {
                    println!("usage: {} <bookingId>", commands[0]);
                    return Ok(true);
                }
            };
            let done = match commands[0] {
                "cf" => desk.bookings.confirm_booking(id).await.map(|_| "confirmed"),
                "cx" => desk.bookings.cancel(id).await.map(|_| "cancelled"),
                _ => desk.bookings.delete(id).await.map(|_| "deleted"),
            };
            if let Ok(what) = done {
                println!("[OK] booking {} {}", id, what);
            }
            desk.print_error();
        }
        "new" => {
            // new <roomId> <customerId> <checkin> <checkout>
            if commands.len() < 5 {
                println!("usage: new <roomId> <customerId> <checkin> <checkout>");
                return Ok(true);
            }
            let input = BookingInput {
                room_id: parse_id(commands.get(1)),
                customer_id: parse_id(commands.get(2)),
                checkin_date: Some(commands[3].to_string()),
                checkout_date: Some(commands[4].to_string()),
                ..Default::default()
            };
            if let Ok(booking) = desk.bookings.create(&input).await {
                views::show_booking_info(&[booking]);
            }
            desk.print_error();
        }
        "rooms" => views::show_room_info(&desk.service.get_rooms().await?),
        "rm" => match parse_id(commands.get(1)) {
            Some(id) => delete_room_flow(desk, lines, id).await?,
            None => println!("usage: rm <roomId>"),
        },
        "role" => println!("{}", views::role_text(resolve_role(&desk.role_sources()))),
        "login" => match parse_id(commands.get(1)) {
            Some(role) => {
                desk.session_storage
                    .set_item(SESSION_USER_KEY, &serde_json::json!({ "roleId": role }).to_string())?;
                desk.local_storage.set_item(AUTH_STORAGE_KEY, &auth_snapshot(role))?;
                desk.persist_role(Some(role))?;
                println!("{}", Notification::Success(views::role_text(role)));
            }
            None => println!("usage: login <roleId>"),
        },
        "logout" => {
            desk.session_storage.remove_item(SESSION_USER_KEY)?;
            desk.local_storage.remove_item(AUTH_STORAGE_KEY)?;
            desk.persist_role(None)?;
        }
        "r" => {
            desk.checkins.fetch_confirmed_bookings().await;
            desk.print_error();
        }
        "cls" | "clear" => print!("\x1B[2J\x1B[1;1H"),
        _ => println!("Unknown command\nPrint \"help\" for more information"),
    }
    Ok(true)
}

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("frontdesk=info")),
        )
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = FrontDeskConfig::load(&config_path)
        .map_err(|e| format!("cannot load {}: {}", config_path, e))?;
    let refresh_cron = config.refresh_cron.clone();
    if GLOBAL_DESK.set(Desk::new(config, config_path)?).is_err() {
        return Err("desk initialised twice".into());
    }
    let desk = GLOBAL_DESK.get().ok_or("desk not initialised")?;
    desk.checkins.fetch_confirmed_bookings().await;
    desk.print_error();

    let mut sched = JobScheduler::new().await?;
    sched
        .add(Job::new_async(refresh_cron.as_str(), |_uuid, _l| {
            Box::pin(async {
                if let Some(desk) = GLOBAL_DESK.get() {
                    desk.checkins.fetch_confirmed_bookings().await;
                    info!("refreshed {} confirmed bookings", desk.checkins.confirmed_bookings().len());
                }
            })
        })?)
        .await?;
    sched.start().await?;

    println!("Welcome to the front desk REPL v0.1!\nPrint \"help\" for more information");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(input) = lines.next_line().await? {
        let commands = input.split_whitespace().collect::<Vec<_>>();
        if commands.is_empty() {
            continue;
        }
        if !run_command(desk, &mut lines, &commands).await? {
            break;
        }
    }
    desk.session_storage.remove_item(SESSION_USER_KEY)?;
    sched.shutdown().await?;
    Ok(())
}
