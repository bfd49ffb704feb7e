fn main() -> eframe::Result {
    room_studio::run_native()
}
