use docstress::error::AppResult;

fn main() -> AppResult<()> {
    docstress::run()
}
